use std::collections::HashMap;

use session::{SessionId, SessionOutput};

use crate::channels::{OutputRx, RouterCommand, RouterRx, SessionWrite, SessionWriteTx};

/// Routes SessionOutput messages to the correct per-session write channel.
pub async fn run_output_router(mut output_rx: OutputRx, mut router_rx: RouterRx) {
    let mut writers: HashMap<SessionId, SessionWriteTx> = HashMap::new();

    loop {
        tokio::select! {
            Some(command) = router_rx.recv() => match command {
                RouterCommand::Attach { session_id, writer } => {
                    tracing::debug!(%session_id, "Output router: writer attached");
                    writers.insert(session_id, writer);
                }
                RouterCommand::Detach(session_id) => {
                    tracing::debug!(%session_id, "Output router: writer detached");
                    writers.remove(&session_id);
                }
            },
            Some(output) = output_rx.recv() => {
                deliver(&mut writers, output);
            }
            else => break,
        }
    }

    tracing::info!("Output router shutting down");
}

fn deliver(writers: &mut HashMap<SessionId, SessionWriteTx>, output: SessionOutput) {
    let Some(tx) = writers.get(&output.session_id) else {
        return;
    };

    let mut open = true;
    if !output.text.is_empty() {
        open = tx.send(SessionWrite::Text(output.text)).is_ok();
    }
    if output.disconnect {
        if open {
            let reason = output.close_reason.unwrap_or_default();
            let _ = tx.send(SessionWrite::Close { reason });
        }
        tracing::debug!(session_id = %output.session_id, "Output router: disconnect requested, dropping writer");
        open = false;
    }
    if !open {
        writers.remove(&output.session_id);
    }
}
