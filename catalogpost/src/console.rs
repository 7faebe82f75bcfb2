use crate::draft::{DraftEdit, DraftField, DraftItem, Photo};
use crate::notification::{NotificationKind, NotificationState};
use crate::orchestrator::{Orchestrator, SubmitOutcome};
use crate::rebuild::{RebuildTrigger, TriggerOutcome};
use crate::validate::missing_requirements;
use log::info;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinSet;

const HELP: &str = "\
commands:
  set <name|notes|price|photo> <value>   edit a field (photo takes a file path)
  clear <field>                          empty a field
  show                                   print the draft and whether it can be submitted
  submit                                 upload the photo and store the item
  rebuild                                trigger a site rebuild
  dismiss                                hide the current notification
  help                                   this text
  quit                                   wait for running work and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Set(DraftField, String),
    Clear(DraftField),
    Show,
    Submit,
    Rebuild,
    Dismiss,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None => (rest, ""),
            };
            if field.is_empty() {
                return Err("usage: set <field> <value>".to_string());
            }
            ConsoleCommand::Set(field.parse()?, value.to_string())
        }
        "clear" => ConsoleCommand::Clear(rest.parse()?),
        "show" => ConsoleCommand::Show,
        "submit" => ConsoleCommand::Submit,
        "rebuild" => ConsoleCommand::Rebuild,
        "dismiss" => ConsoleCommand::Dismiss,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("Unknown command: {} (try help)", other)),
    };

    Ok(Some(command))
}

pub fn render_notification(state: &NotificationState) -> Option<String> {
    if !state.visible {
        return None;
    }
    let tag = match state.kind {
        NotificationKind::Success => "success",
        NotificationKind::Danger => "danger",
    };
    Some(format!("[{}] {}", tag, state.message))
}

fn render_draft(draft: &DraftItem) -> String {
    let photo = draft
        .photo
        .as_ref()
        .map(|p| format!("{} ({} bytes)", p.file_name, p.bytes.len()))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "name:  {}\nnotes: {}\nprice: {} (thousands)\nphoto: {}",
        draft.name, draft.notes, draft.price_thousands, photo
    )
}

type SharedOutput<W> = Arc<Mutex<W>>;

async fn write_line<W: AsyncWrite + Unpin>(out: &SharedOutput<W>, line: &str) -> io::Result<()> {
    let mut out = out.lock().await;
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Line-oriented operator session. Submissions and rebuilds run in the
/// background so the gates can be observed while they are in flight.
pub async fn run_console<R, W>(
    orchestrator: Arc<Orchestrator>,
    rebuild: Option<Arc<RebuildTrigger>>,
    input: R,
    output: W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let out: SharedOutput<W> = Arc::new(Mutex::new(output));
    let mut running = JoinSet::new();

    let mut notifications = orchestrator.notifications().subscribe();
    let (close_tx, mut close_rx) = oneshot::channel::<()>();
    let watcher = tokio::spawn({
        let out = out.clone();
        async move {
            loop {
                let closing = tokio::select! {
                    biased;
                    changed = notifications.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        false
                    }
                    _ = &mut close_rx => true,
                };
                // On close, print what the last task showed before it finished
                if closing && !notifications.has_changed().unwrap_or(false) {
                    break;
                }

                let rendered = render_notification(&notifications.borrow_and_update());
                if let Some(line) = rendered {
                    if write_line(&out, &line).await.is_err() {
                        break;
                    }
                }
                if closing {
                    break;
                }
            }
        }
    });

    write_line(&out, "catalogpost console, type help for commands").await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                write_line(&out, &msg).await?;
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => write_line(&out, HELP).await?,
            ConsoleCommand::Show => {
                let draft = orchestrator.draft().await;
                let missing = missing_requirements(&draft, orchestrator.state().await);
                write_line(&out, &render_draft(&draft)).await?;
                if missing.is_empty() {
                    write_line(&out, "ready to submit").await?;
                } else {
                    for requirement in missing {
                        write_line(&out, &format!("- {}", requirement.describe())).await?;
                    }
                }
            }
            ConsoleCommand::Set(DraftField::Photo, path) => match Photo::load(&path).await {
                Ok(photo) => orchestrator.edit(DraftEdit::Photo(Some(photo))).await,
                Err(e) => write_line(&out, &e.to_string()).await?,
            },
            ConsoleCommand::Set(field, value) => {
                let edit = match field {
                    DraftField::Name => DraftEdit::Name(value),
                    DraftField::Notes => DraftEdit::Notes(value),
                    DraftField::PriceThousands => DraftEdit::PriceThousands(value),
                    DraftField::Photo => continue,
                };
                orchestrator.edit(edit).await;
            }
            ConsoleCommand::Clear(field) => orchestrator.edit(DraftEdit::cleared(field)).await,
            ConsoleCommand::Dismiss => orchestrator.notifications().dismiss(),
            ConsoleCommand::Submit => {
                if !orchestrator.can_submit().await {
                    write_line(&out, "submit is disabled, see show").await?;
                    continue;
                }
                let orchestrator = orchestrator.clone();
                let out = out.clone();
                running.spawn(async move {
                    let line = match orchestrator.submit().await {
                        SubmitOutcome::Submitted(record) => {
                            format!("stored {} at {}", record.name, record.photo_url)
                        }
                        SubmitOutcome::Failed(e) => format!("submission failed: {}", e),
                        SubmitOutcome::Skipped => "submit is disabled, see show".to_string(),
                    };
                    write_line(&out, &line).await.ok();
                });
            }
            ConsoleCommand::Rebuild => {
                let Some(trigger) = rebuild.clone() else {
                    write_line(&out, "rebuild is not configured").await?;
                    continue;
                };
                let out = out.clone();
                running.spawn(async move {
                    let line = match trigger.trigger().await {
                        TriggerOutcome::Rejected => "rebuild already in progress",
                        TriggerOutcome::Settled => "rebuild requested",
                    };
                    write_line(&out, line).await.ok();
                });
            }
        }
    }

    info!("Console closing, waiting for {} running task(s)", running.len());
    while running.join_next().await.is_some() {}
    close_tx.send(()).ok();
    watcher.await.ok();

    Ok(())
}
