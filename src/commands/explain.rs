use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatch::Dispatcher;
use crate::request::{RawRequest, Response};
use crate::ui::render::render_terminal;
use crate::ui::{Key, ModalPresenter, SelectionDetector};

/// Input line that closes the terminal modal, standing in for `Escape`.
pub const CLOSE_COMMAND: &str = "/close";

pub async fn explain_once(dispatcher: &Dispatcher, text: &str) -> Response {
    dispatcher.handle(&RawRequest::explain(text)).await
}

/// Runs the explanation modal in a terminal: explains `selection`, then answers
/// follow-up questions read line by line until `/close`, an escape character or
/// end of input.
pub async fn run_chat_session<R, W>(
    dispatcher: &Dispatcher,
    selection: &str,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut detector = SelectionDetector::new();
    detector.on_pointer_up(selection, 0.0, 0.0);

    let mut modal = ModalPresenter::new();
    let mut pending = match modal.open(&detector.activate()) {
        Ok(pending) => Some(pending),
        Err(alert) => {
            output.write_all(format!("{}\n", alert).as_bytes()).await?;
            output.flush().await?;
            return Ok(());
        }
    };

    let mut lines = input.lines();
    loop {
        // The modal only hands out one request at a time, so this is the only
        // await on the provider per turn.
        if let Some(request) = pending.take() {
            let response = dispatcher.handle(&request.request).await;
            if modal.apply_response(request.session, response) {
                if let Some(entry) = modal.transcript().last() {
                    output
                        .write_all(format!("{}\n", render_terminal(entry)).as_bytes())
                        .await?;
                }
            }
            output.flush().await?;
        }

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let key = if line.trim() == CLOSE_COMMAND || line.contains('\u{1b}') {
            Key::Escape
        } else {
            Key::Enter
        };
        pending = modal.handle_key(key, &line);
        if !modal.is_open() {
            break;
        }
    }

    modal.close();
    debug!("Terminal chat session ended");
    Ok(())
}
