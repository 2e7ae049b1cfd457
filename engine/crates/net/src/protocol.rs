use std::fmt;

use ids::EntityId;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Message type codes, the first element of every wire tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MessageKind {
    Hello = 0,
    Welcome = 1,
    Spawn = 2,
    Despawn = 3,
    Move = 4,
    LootMove = 5,
    Aggro = 6,
    Attack = 7,
    Hit = 8,
    Hurt = 9,
    Health = 10,
    Chat = 11,
    Loot = 12,
    Equip = 13,
    Drop = 14,
    Teleport = 15,
    Damage = 16,
    Population = 17,
    Kill = 18,
    List = 19,
    Who = 20,
    Zone = 21,
    Destroy = 22,
    HitPoints = 23,
    Blink = 24,
    Open = 25,
    Check = 26,
}

impl MessageKind {
    pub const ALL: [MessageKind; 27] = [
        MessageKind::Hello,
        MessageKind::Welcome,
        MessageKind::Spawn,
        MessageKind::Despawn,
        MessageKind::Move,
        MessageKind::LootMove,
        MessageKind::Aggro,
        MessageKind::Attack,
        MessageKind::Hit,
        MessageKind::Hurt,
        MessageKind::Health,
        MessageKind::Chat,
        MessageKind::Loot,
        MessageKind::Equip,
        MessageKind::Drop,
        MessageKind::Teleport,
        MessageKind::Damage,
        MessageKind::Population,
        MessageKind::Kill,
        MessageKind::List,
        MessageKind::Who,
        MessageKind::Zone,
        MessageKind::Destroy,
        MessageKind::HitPoints,
        MessageKind::Blink,
        MessageKind::Open,
        MessageKind::Check,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Welcome => "WELCOME",
            MessageKind::Spawn => "SPAWN",
            MessageKind::Despawn => "DESPAWN",
            MessageKind::Move => "MOVE",
            MessageKind::LootMove => "LOOTMOVE",
            MessageKind::Aggro => "AGGRO",
            MessageKind::Attack => "ATTACK",
            MessageKind::Hit => "HIT",
            MessageKind::Hurt => "HURT",
            MessageKind::Health => "HEALTH",
            MessageKind::Chat => "CHAT",
            MessageKind::Loot => "LOOT",
            MessageKind::Equip => "EQUIP",
            MessageKind::Drop => "DROP",
            MessageKind::Teleport => "TELEPORT",
            MessageKind::Damage => "DAMAGE",
            MessageKind::Population => "POPULATION",
            MessageKind::Kill => "KILL",
            MessageKind::List => "LIST",
            MessageKind::Who => "WHO",
            MessageKind::Zone => "ZONE",
            MessageKind::Destroy => "DESTROY",
            MessageKind::HitPoints => "HP",
            MessageKind::Blink => "BLINK",
            MessageKind::Open => "OPEN",
            MessageKind::Check => "CHECK",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("message is not an array")]
    NotAnArray,

    #[error("empty message")]
    Empty,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("{0} is not a client message")]
    NotClientMessage(MessageKind),

    #[error("invalid {kind} message format: expected {expected} fields, got {got}")]
    Arity {
        kind: MessageKind,
        expected: usize,
        got: usize,
    },

    #[error("invalid {kind} message format: field {index} must be {expected}")]
    FieldType {
        kind: MessageKind,
        index: usize,
        expected: &'static str,
    },
}

/// Client-to-server message, decoded from a tagged JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Hello { name: String, armor: i64, weapon: i64 },
    Who { ids: Vec<EntityId> },
    Zone,
    Chat { text: String },
    Move { x: i32, y: i32 },
    LootMove { x: i32, y: i32, item: EntityId },
    Aggro { mob: EntityId },
    Attack { mob: EntityId },
    Hit { mob: EntityId },
    Hurt { mob: EntityId },
    Loot { item: EntityId },
    Teleport { x: i32, y: i32 },
    Open { chest: EntityId },
    Check { checkpoint: u64 },
}

impl ClientMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ClientMessage::Hello { .. } => MessageKind::Hello,
            ClientMessage::Who { .. } => MessageKind::Who,
            ClientMessage::Zone => MessageKind::Zone,
            ClientMessage::Chat { .. } => MessageKind::Chat,
            ClientMessage::Move { .. } => MessageKind::Move,
            ClientMessage::LootMove { .. } => MessageKind::LootMove,
            ClientMessage::Aggro { .. } => MessageKind::Aggro,
            ClientMessage::Attack { .. } => MessageKind::Attack,
            ClientMessage::Hit { .. } => MessageKind::Hit,
            ClientMessage::Hurt { .. } => MessageKind::Hurt,
            ClientMessage::Loot { .. } => MessageKind::Loot,
            ClientMessage::Teleport { .. } => MessageKind::Teleport,
            ClientMessage::Open { .. } => MessageKind::Open,
            ClientMessage::Check { .. } => MessageKind::Check,
        }
    }

    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Json(e.to_string()))?;
        Self::decode(&value)
    }

    /// Decode a `[type, args...]` array, checking arity and field types.
    pub fn decode(value: &Value) -> Result<Self, ProtocolError> {
        let items = value.as_array().ok_or(ProtocolError::NotAnArray)?;
        let (head, args) = items.split_first().ok_or(ProtocolError::Empty)?;
        let code = head
            .as_i64()
            .ok_or_else(|| ProtocolError::UnknownType(head.to_string()))?;
        let kind =
            MessageKind::from_code(code).ok_or_else(|| ProtocolError::UnknownType(code.to_string()))?;

        let fields = Fields { kind, args };
        let msg = match kind {
            MessageKind::Hello => {
                fields.arity(3)?;
                ClientMessage::Hello {
                    name: fields.string(0)?,
                    armor: fields.int(1)?,
                    weapon: fields.int(2)?,
                }
            }
            MessageKind::Who => {
                if args.is_empty() {
                    return Err(ProtocolError::Arity {
                        kind,
                        expected: 1,
                        got: 0,
                    });
                }
                let ids = (0..args.len())
                    .map(|i| fields.entity(i))
                    .collect::<Result<Vec<_>, _>>()?;
                ClientMessage::Who { ids }
            }
            MessageKind::Zone => {
                fields.arity(0)?;
                ClientMessage::Zone
            }
            MessageKind::Chat => {
                fields.arity(1)?;
                ClientMessage::Chat {
                    text: fields.string(0)?,
                }
            }
            MessageKind::Move => {
                fields.arity(2)?;
                ClientMessage::Move {
                    x: fields.coord(0)?,
                    y: fields.coord(1)?,
                }
            }
            MessageKind::LootMove => {
                fields.arity(3)?;
                ClientMessage::LootMove {
                    x: fields.coord(0)?,
                    y: fields.coord(1)?,
                    item: fields.entity(2)?,
                }
            }
            MessageKind::Aggro => {
                fields.arity(1)?;
                ClientMessage::Aggro {
                    mob: fields.entity(0)?,
                }
            }
            MessageKind::Attack => {
                fields.arity(1)?;
                ClientMessage::Attack {
                    mob: fields.entity(0)?,
                }
            }
            MessageKind::Hit => {
                fields.arity(1)?;
                ClientMessage::Hit {
                    mob: fields.entity(0)?,
                }
            }
            MessageKind::Hurt => {
                fields.arity(1)?;
                ClientMessage::Hurt {
                    mob: fields.entity(0)?,
                }
            }
            MessageKind::Loot => {
                fields.arity(1)?;
                ClientMessage::Loot {
                    item: fields.entity(0)?,
                }
            }
            MessageKind::Teleport => {
                fields.arity(2)?;
                ClientMessage::Teleport {
                    x: fields.coord(0)?,
                    y: fields.coord(1)?,
                }
            }
            MessageKind::Open => {
                fields.arity(1)?;
                ClientMessage::Open {
                    chest: fields.entity(0)?,
                }
            }
            MessageKind::Check => {
                fields.arity(1)?;
                ClientMessage::Check {
                    checkpoint: fields.unsigned(0)?,
                }
            }
            MessageKind::Welcome
            | MessageKind::Spawn
            | MessageKind::Despawn
            | MessageKind::Health
            | MessageKind::Equip
            | MessageKind::Drop
            | MessageKind::Damage
            | MessageKind::Population
            | MessageKind::Kill
            | MessageKind::List
            | MessageKind::Destroy
            | MessageKind::HitPoints
            | MessageKind::Blink => return Err(ProtocolError::NotClientMessage(kind)),
        };
        Ok(msg)
    }
}

struct Fields<'a> {
    kind: MessageKind,
    args: &'a [Value],
}

impl Fields<'_> {
    fn arity(&self, expected: usize) -> Result<(), ProtocolError> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(ProtocolError::Arity {
                kind: self.kind,
                expected,
                got: self.args.len(),
            })
        }
    }

    fn type_error(&self, index: usize, expected: &'static str) -> ProtocolError {
        ProtocolError::FieldType {
            kind: self.kind,
            index,
            expected,
        }
    }

    fn string(&self, index: usize) -> Result<String, ProtocolError> {
        self.args
            .get(index)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| self.type_error(index, "a string"))
    }

    fn int(&self, index: usize) -> Result<i64, ProtocolError> {
        self.args
            .get(index)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.type_error(index, "an integer"))
    }

    fn coord(&self, index: usize) -> Result<i32, ProtocolError> {
        self.int(index)
            .ok()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| self.type_error(index, "a coordinate"))
    }

    fn unsigned(&self, index: usize) -> Result<u64, ProtocolError> {
        self.args
            .get(index)
            .and_then(Value::as_u64)
            .ok_or_else(|| self.type_error(index, "a non-negative integer"))
    }

    fn entity(&self, index: usize) -> Result<EntityId, ProtocolError> {
        self.unsigned(index).map(EntityId::new)
    }
}

/// Type-specific tail of a SPAWN tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnDetail {
    /// Items and chests: id, kind and position only.
    Plain,
    Character {
        orientation: u8,
        target: Option<EntityId>,
    },
    Player {
        name: String,
        orientation: u8,
        armor: u32,
        weapon: u32,
        target: Option<EntityId>,
    },
}

/// Full visible state of an entity, as carried by SPAWN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnState {
    pub id: EntityId,
    pub kind: u32,
    pub x: i32,
    pub y: i32,
    pub detail: SpawnDetail,
}

/// Server-to-client message. Serializes as `[code, fields...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Welcome {
        id: EntityId,
        name: String,
        x: i32,
        y: i32,
        hit_points: i32,
    },
    Spawn(SpawnState),
    Despawn {
        id: EntityId,
    },
    Move {
        id: EntityId,
        x: i32,
        y: i32,
    },
    LootMove {
        id: EntityId,
        item: EntityId,
    },
    Attack {
        attacker: EntityId,
        target: Option<EntityId>,
    },
    Health {
        points: i32,
        regen: bool,
    },
    Chat {
        id: EntityId,
        text: String,
    },
    Equip {
        id: EntityId,
        kind: u32,
    },
    Drop {
        mob: EntityId,
        item: EntityId,
        kind: u32,
        haters: Vec<EntityId>,
    },
    Teleport {
        id: EntityId,
        x: i32,
        y: i32,
    },
    Damage {
        id: EntityId,
        points: i32,
    },
    Population {
        world: usize,
        total: usize,
    },
    Kill {
        kind: u32,
    },
    List {
        ids: Vec<EntityId>,
    },
    Destroy {
        id: EntityId,
    },
    HitPoints {
        max: i32,
    },
    Blink {
        id: EntityId,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::Welcome { .. } => MessageKind::Welcome,
            ServerMessage::Spawn(_) => MessageKind::Spawn,
            ServerMessage::Despawn { .. } => MessageKind::Despawn,
            ServerMessage::Move { .. } => MessageKind::Move,
            ServerMessage::LootMove { .. } => MessageKind::LootMove,
            ServerMessage::Attack { .. } => MessageKind::Attack,
            ServerMessage::Health { .. } => MessageKind::Health,
            ServerMessage::Chat { .. } => MessageKind::Chat,
            ServerMessage::Equip { .. } => MessageKind::Equip,
            ServerMessage::Drop { .. } => MessageKind::Drop,
            ServerMessage::Teleport { .. } => MessageKind::Teleport,
            ServerMessage::Damage { .. } => MessageKind::Damage,
            ServerMessage::Population { .. } => MessageKind::Population,
            ServerMessage::Kill { .. } => MessageKind::Kill,
            ServerMessage::List { .. } => MessageKind::List,
            ServerMessage::Destroy { .. } => MessageKind::Destroy,
            ServerMessage::HitPoints { .. } => MessageKind::HitPoints,
            ServerMessage::Blink { .. } => MessageKind::Blink,
        }
    }

    /// The tagged-array form.
    pub fn to_value(&self) -> Value {
        let code = self.kind().code();
        match self {
            ServerMessage::Welcome {
                id,
                name,
                x,
                y,
                hit_points,
            } => json!([code, id, name, x, y, hit_points]),
            ServerMessage::Spawn(state) => {
                let mut tuple = vec![json!(code), json!(state.id), json!(state.kind), json!(state.x), json!(state.y)];
                match &state.detail {
                    SpawnDetail::Plain => {}
                    SpawnDetail::Character {
                        orientation,
                        target,
                    } => {
                        tuple.push(json!(orientation));
                        if let Some(t) = target {
                            tuple.push(json!(t));
                        }
                    }
                    SpawnDetail::Player {
                        name,
                        orientation,
                        armor,
                        weapon,
                        target,
                    } => {
                        tuple.push(json!(name));
                        tuple.push(json!(orientation));
                        tuple.push(json!(armor));
                        tuple.push(json!(weapon));
                        if let Some(t) = target {
                            tuple.push(json!(t));
                        }
                    }
                }
                Value::Array(tuple)
            }
            ServerMessage::Despawn { id } => json!([code, id]),
            ServerMessage::Move { id, x, y } => json!([code, id, x, y]),
            ServerMessage::LootMove { id, item } => json!([code, id, item]),
            ServerMessage::Attack { attacker, target } => json!([code, attacker, target]),
            ServerMessage::Health { points, regen } => {
                if *regen {
                    json!([code, points, 1])
                } else {
                    json!([code, points])
                }
            }
            ServerMessage::Chat { id, text } => json!([code, id, text]),
            ServerMessage::Equip { id, kind } => json!([code, id, kind]),
            ServerMessage::Drop {
                mob,
                item,
                kind,
                haters,
            } => json!([code, mob, item, kind, haters]),
            ServerMessage::Teleport { id, x, y } => json!([code, id, x, y]),
            ServerMessage::Damage { id, points } => json!([code, id, points]),
            ServerMessage::Population { world, total } => json!([code, world, total]),
            ServerMessage::Kill { kind } => json!([code, kind]),
            ServerMessage::List { ids } => {
                let mut tuple = Vec::with_capacity(ids.len() + 1);
                tuple.push(json!(code));
                tuple.extend(ids.iter().map(|id| json!(id)));
                Value::Array(tuple)
            }
            ServerMessage::Destroy { id } => json!([code, id]),
            ServerMessage::HitPoints { max } => json!([code, max]),
            ServerMessage::Blink { id } => json!([code, id]),
        }
    }
}

impl Serialize for ServerMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// One outbound write: a single tuple, or an array of tuples when several
/// messages accumulated during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame(pub Vec<ServerMessage>);

impl Frame {
    pub fn single(msg: ServerMessage) -> Self {
        Frame(vec![msg])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_value(&self) -> Value {
        match self.0.as_slice() {
            [only] => only.to_value(),
            many => Value::Array(many.iter().map(ServerMessage::to_value).collect()),
        }
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_codes_round_trip() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_code(kind.code() as i64), Some(kind));
        }
        assert_eq!(MessageKind::from_code(27), None);
        assert_eq!(MessageKind::from_code(-1), None);
        assert_eq!(MessageKind::HitPoints.code(), 23);
        assert_eq!(MessageKind::Check.code(), 26);
    }

    #[test]
    fn parse_hello() {
        let msg = ClientMessage::parse(r#"[0, "alice", 21, 60]"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Hello {
                name: "alice".into(),
                armor: 21,
                weapon: 60
            }
        );
        assert_eq!(msg.kind(), MessageKind::Hello);
    }

    #[test]
    fn parse_movement() {
        assert_eq!(
            ClientMessage::parse("[4, 10, -3]").unwrap(),
            ClientMessage::Move { x: 10, y: -3 }
        );
        assert_eq!(
            ClientMessage::parse("[5, 10, 3, 99]").unwrap(),
            ClientMessage::LootMove {
                x: 10,
                y: 3,
                item: EntityId(99)
            }
        );
    }

    #[test]
    fn parse_who_is_variadic() {
        assert_eq!(
            ClientMessage::parse("[20, 1, 2, 3]").unwrap(),
            ClientMessage::Who {
                ids: vec![EntityId(1), EntityId(2), EntityId(3)]
            }
        );
        assert!(matches!(
            ClientMessage::parse("[20]"),
            Err(ProtocolError::Arity { kind: MessageKind::Who, .. })
        ));
        assert!(matches!(
            ClientMessage::parse(r#"[20, 1, "x"]"#),
            Err(ProtocolError::FieldType { index: 1, .. })
        ));
    }

    #[test]
    fn parse_zone_takes_no_arguments() {
        assert_eq!(ClientMessage::parse("[21]").unwrap(), ClientMessage::Zone);
        assert!(ClientMessage::parse("[21, 1]").is_err());
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let err = ClientMessage::parse("[4, 1]").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Arity {
                kind: MessageKind::Move,
                expected: 2,
                got: 1
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid MOVE message format: expected 2 fields, got 1"
        );
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        assert!(matches!(
            ClientMessage::parse(r#"[0, 5, 21, 60]"#),
            Err(ProtocolError::FieldType { index: 0, .. })
        ));
        assert!(matches!(
            ClientMessage::parse(r#"[11, 42]"#),
            Err(ProtocolError::FieldType { kind: MessageKind::Chat, .. })
        ));
        assert!(matches!(
            ClientMessage::parse("[4, 1.5, 2]"),
            Err(ProtocolError::FieldType { .. })
        ));
        assert!(matches!(
            ClientMessage::parse("[8, -4]"),
            Err(ProtocolError::FieldType { .. })
        ));
    }

    #[test]
    fn malformed_envelopes() {
        assert!(matches!(ClientMessage::parse("nope"), Err(ProtocolError::Json(_))));
        assert_eq!(ClientMessage::parse("{}"), Err(ProtocolError::NotAnArray));
        assert_eq!(ClientMessage::parse("[]"), Err(ProtocolError::Empty));
        assert!(matches!(
            ClientMessage::parse("[99]"),
            Err(ProtocolError::UnknownType(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"["4", 1, 2]"#),
            Err(ProtocolError::UnknownType(_))
        ));
        assert_eq!(
            ClientMessage::parse("[1, 2]"),
            Err(ProtocolError::NotClientMessage(MessageKind::Welcome))
        );
    }

    #[test]
    fn serialize_welcome() {
        let msg = ServerMessage::Welcome {
            id: EntityId(5),
            name: "alice".into(),
            x: 10,
            y: 20,
            hit_points: 80,
        };
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"[1,5,"alice",10,20,80]"#);
    }

    #[test]
    fn serialize_spawn_variants() {
        let item = ServerMessage::Spawn(SpawnState {
            id: EntityId(9),
            kind: 35,
            x: 3,
            y: 4,
            detail: SpawnDetail::Plain,
        });
        assert_eq!(item.to_value(), json!([2, 9, 35, 3, 4]));

        let mob = ServerMessage::Spawn(SpawnState {
            id: EntityId(7),
            kind: 2,
            x: 3,
            y: 4,
            detail: SpawnDetail::Character {
                orientation: 2,
                target: Some(EntityId(1)),
            },
        });
        assert_eq!(mob.to_value(), json!([2, 7, 2, 3, 4, 2, 1]));

        let player = ServerMessage::Spawn(SpawnState {
            id: EntityId(1),
            kind: 1,
            x: 3,
            y: 4,
            detail: SpawnDetail::Player {
                name: "bob".into(),
                orientation: 4,
                armor: 21,
                weapon: 60,
                target: None,
            },
        });
        assert_eq!(player.to_value(), json!([2, 1, 1, 3, 4, "bob", 4, 21, 60]));
    }

    #[test]
    fn serialize_optional_fields() {
        assert_eq!(
            ServerMessage::Health {
                points: 50,
                regen: true
            }
            .to_value(),
            json!([10, 50, 1])
        );
        assert_eq!(
            ServerMessage::Health {
                points: 50,
                regen: false
            }
            .to_value(),
            json!([10, 50])
        );
        assert_eq!(
            ServerMessage::Attack {
                attacker: EntityId(3),
                target: None
            }
            .to_value(),
            json!([7, 3, null])
        );
    }

    #[test]
    fn serialize_lists() {
        assert_eq!(
            ServerMessage::List {
                ids: vec![EntityId(4), EntityId(8)]
            }
            .to_value(),
            json!([19, 4, 8])
        );
        assert_eq!(
            ServerMessage::Drop {
                mob: EntityId(3),
                item: EntityId(10),
                kind: 35,
                haters: vec![EntityId(1)]
            }
            .to_value(),
            json!([14, 3, 10, 35, [1]])
        );
    }

    #[test]
    fn frame_batches_only_when_needed() {
        let one = Frame::single(ServerMessage::Destroy { id: EntityId(2) });
        assert_eq!(one.to_json(), "[22,2]");

        let two = Frame(vec![
            ServerMessage::Destroy { id: EntityId(2) },
            ServerMessage::Blink { id: EntityId(3) },
        ]);
        assert_eq!(two.to_json(), "[[22,2],[24,3]]");
        assert_eq!(two.len(), 2);
    }
}
