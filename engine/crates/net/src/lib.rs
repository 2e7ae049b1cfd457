pub mod channels;
pub mod connection;
pub mod output_router;
pub mod protocol;
pub mod ws_server;

pub use channels::NetToTick;
pub use connection::{ChannelConnection, Connection};
pub use protocol::{ClientMessage, Frame, MessageKind, ProtocolError, ServerMessage, SpawnDetail, SpawnState};
