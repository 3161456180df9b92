//! Commands that can be sent to the glasses.
//!
//! Every payload starts with field 1 = command type and, for commands that
//! carry one, field 2 = message ID. The remaining records were captured from
//! the companion app and are replayed as-is.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::paginate::{paginate_text, Page};
use crate::types::{GestureKind, ScrollMode, ServiceId};
use crate::wire::FieldWriter;

/// Commands that can be sent to the glasses after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Turn the display on.
    DisplayWake,

    /// Send the static display configuration.
    DisplayConfig,

    /// Prepare the teleprompter for a content stream.
    TeleprompterInit {
        /// Lines across all pages that will follow.
        total_lines: u32,
        /// Manual or automatic scrolling.
        mode: ScrollMode,
    },

    /// One page of content.
    ContentPage {
        /// 0-based page index.
        page_index: u32,
        /// Up to 10 lines of up to 25 characters; padded on encode.
        lines: Vec<String>,
    },

    /// Required by the firmware after page 9 before later pages.
    MidStreamMarker,

    /// End of the content stream.
    ContentComplete {
        /// Pages sent.
        total_pages: u32,
        /// Lines sent.
        total_lines: u32,
    },

    /// Ask the glasses to render what was sent.
    SyncTrigger,

    /// Enable or disable gesture notifications.
    GestureConfig {
        /// Master switch.
        enabled: bool,
        /// Gestures to report.
        gestures: Vec<GestureKind>,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::DisplayWake => "display_wake",
            Command::DisplayConfig => "display_config",
            Command::TeleprompterInit { .. } => "teleprompter_init",
            Command::ContentPage { .. } => "content_page",
            Command::MidStreamMarker => "mid_stream_marker",
            Command::ContentComplete { .. } => "content_complete",
            Command::SyncTrigger => "sync_trigger",
            Command::GestureConfig { .. } => "gesture_config",
        }
    }

    /// Service this command is sent on.
    pub fn service_id(&self) -> ServiceId {
        match self {
            Command::DisplayWake => ServiceId::DISPLAY_WAKE,
            Command::DisplayConfig => ServiceId::DISPLAY_CONFIG,
            Command::TeleprompterInit { .. }
            | Command::ContentPage { .. }
            | Command::MidStreamMarker
            | Command::ContentComplete { .. } => ServiceId::TELEPROMPTER,
            Command::SyncTrigger => ServiceId::AUTH_CONTROL,
            Command::GestureConfig { .. } => ServiceId::CONFIGURATION,
        }
    }

    /// Value of field 1.
    pub fn command_type(&self) -> u64 {
        match self {
            Command::DisplayWake => CMD_TYPE_DISPLAY_WAKE,
            Command::DisplayConfig => CMD_TYPE_DISPLAY_CONFIG,
            Command::TeleprompterInit { .. } => CMD_TYPE_TELEPROMPTER_INIT,
            Command::ContentPage { .. } => CMD_TYPE_CONTENT_PAGE,
            Command::MidStreamMarker => CMD_TYPE_MID_STREAM_MARKER,
            Command::ContentComplete { .. } => CMD_TYPE_CONTENT_COMPLETE,
            Command::SyncTrigger => CMD_TYPE_SYNC_TRIGGER,
            Command::GestureConfig { .. } => CMD_TYPE_GESTURE_CONFIG,
        }
    }

    /// Whether this command consumes a message ID.
    pub fn uses_message_id(&self) -> bool {
        !matches!(self, Command::DisplayWake | Command::SyncTrigger)
    }

    /// Reject parameters that would put malformed data on the wire.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Command::TeleprompterInit { total_lines: 0, .. } => Err(ProtocolError::InvalidCommand(
                "teleprompter init needs at least one line".to_string(),
            )),
            Command::ContentPage { page_index, lines } => {
                if lines.is_empty() {
                    return Err(ProtocolError::InvalidCommand(format!(
                        "content page {} has no lines",
                        page_index
                    )));
                }
                if Page::from_lines(lines).is_none() {
                    return Err(ProtocolError::InvalidCommand(format!(
                        "content page {} exceeds {} lines of {} characters",
                        page_index, LINES_PER_PAGE, LINE_WIDTH
                    )));
                }
                Ok(())
            }
            Command::ContentComplete { total_pages: 0, .. } => Err(ProtocolError::InvalidCommand(
                "content complete with zero pages".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Encode the payload (without framing).
    ///
    /// `message_id` is written as field 2 when present.
    pub fn encode_payload(&self, message_id: Option<u32>) -> Result<Vec<u8>, ProtocolError> {
        self.validate()?;

        let mut w = FieldWriter::new();
        w.varint(1, self.command_type());
        if let Some(id) = message_id {
            w.varint(2, id as u64);
        }

        match self {
            Command::DisplayWake => {
                w.message(3, |m| {
                    m.varint(1, 1).varint(2, 1).varint(3, 5);
                });
            }

            Command::DisplayConfig => {
                w.bytes(4, &DISPLAY_CONFIG_BLOB);
            }

            Command::TeleprompterInit { total_lines, mode } => {
                let height = content_height(*total_lines);
                w.message(3, |settings| {
                    settings.varint(1, 1).message(2, |display| {
                        display
                            .varint(1, 1)
                            .varint(2, 0)
                            .varint(3, 0)
                            .varint(4, 267)
                            .varint(5, height)
                            .varint(6, 230)
                            .varint(7, 1294)
                            .varint(8, 5)
                            .varint(9, mode.to_wire());
                    });
                });
            }

            Command::ContentPage { page_index, lines } => {
                // validate() guarantees the page fits.
                let text = Page::from_lines(lines)
                    .map(|page| page.to_wire_text())
                    .unwrap_or_default();
                w.message(5, |content| {
                    content
                        .varint(1, *page_index as u64)
                        .varint(2, LINES_PER_PAGE as u64)
                        .bytes(3, text.as_bytes());
                });
            }

            Command::MidStreamMarker => {
                w.message(13, |m| {
                    m.varint(1, 0).varint(2, 6);
                });
            }

            Command::ContentComplete {
                total_pages,
                total_lines,
            } => {
                w.message(6, |m| {
                    m.varint(1, *total_pages as u64).varint(2, *total_lines as u64);
                });
            }

            Command::SyncTrigger => {
                w.message(13, |_| {});
            }

            Command::GestureConfig { enabled, gestures } => {
                let mask = gestures.iter().fold(0u64, |mask, g| mask | g.mask_bit());
                w.message(8, |m| {
                    m.varint(1, *enabled as u64).varint(2, mask);
                });
            }
        }

        Ok(w.finish())
    }
}

/// Content height for the teleprompter: `max(1, total_lines * 2665 / 140)`.
pub fn content_height(total_lines: u32) -> u64 {
    (total_lines as u64 * CONTENT_HEIGHT_SCALE / CONTENT_HEIGHT_BASE_LINES).max(1)
}

/// The full command stream that puts `text` on the teleprompter.
///
/// Wake, config, init, every page (with the mid-stream marker after page 9),
/// content-complete, sync. Pages should be spaced at least
/// [`MIN_PAGE_SPACING_MS`] apart on the wire.
pub fn teleprompter_plan(text: &str, mode: ScrollMode) -> Vec<Command> {
    plan_pages(&paginate_text(text), mode)
}

/// The command stream for already paginated content.
pub fn plan_pages(pages: &[Page], mode: ScrollMode) -> Vec<Command> {
    let total_pages = pages.len() as u32;
    let total_lines = total_pages * LINES_PER_PAGE as u32;

    let mut commands = Vec::with_capacity(pages.len() + 6);
    commands.push(Command::DisplayWake);
    commands.push(Command::DisplayConfig);
    commands.push(Command::TeleprompterInit { total_lines, mode });

    for (index, page) in pages.iter().enumerate() {
        commands.push(Command::ContentPage {
            page_index: index as u32,
            lines: page.lines().to_vec(),
        });
        if index == MID_STREAM_MARKER_AFTER_PAGE && index + 1 < pages.len() {
            commands.push(Command::MidStreamMarker);
        }
    }

    commands.push(Command::ContentComplete {
        total_pages,
        total_lines,
    });
    commands.push(Command::SyncTrigger);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FieldReader;

    #[test]
    fn test_content_height() {
        assert_eq!(content_height(140), 2665);
        assert_eq!(content_height(1), 19);
        assert_eq!(content_height(0), 1);
        assert_eq!(content_height(10), 190);
    }

    #[test]
    fn test_display_wake_payload() {
        let payload = Command::DisplayWake.encode_payload(None).unwrap();
        assert_eq!(
            payload,
            vec![0x08, 0x01, 0x1A, 0x06, 0x08, 0x01, 0x10, 0x01, 0x18, 0x05]
        );
    }

    #[test]
    fn test_teleprompter_init_payload() {
        let cmd = Command::TeleprompterInit {
            total_lines: 140,
            mode: ScrollMode::Manual,
        };
        let payload = cmd.encode_payload(Some(0x15)).unwrap();
        let display = [
            0x08, 0x01, 0x10, 0x00, 0x18, 0x00, 0x20, 0x8B, 0x02, 0x28, 0xE9, 0x14, 0x30, 0xE6,
            0x01, 0x38, 0x8E, 0x0A, 0x40, 0x05, 0x48, 0x00,
        ];
        let mut expected = vec![0x08, 0x01, 0x10, 0x15, 0x1A, display.len() as u8 + 4];
        expected.extend_from_slice(&[0x08, 0x01, 0x12, display.len() as u8]);
        expected.extend_from_slice(&display);
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_content_page_payload() {
        let cmd = Command::ContentPage {
            page_index: 3,
            lines: vec!["hello".to_string()],
        };
        let payload = cmd.encode_payload(Some(0x20)).unwrap();
        let fields = FieldReader::collect_all(&payload).unwrap();
        assert_eq!(fields[0].as_varint(), Some(3));
        assert_eq!(fields[1].as_varint(), Some(0x20));
        assert_eq!(fields[2].number, 5);

        let inner = FieldReader::collect_all(fields[2].as_bytes().unwrap()).unwrap();
        assert_eq!(inner[0].as_varint(), Some(3));
        assert_eq!(inner[1].as_varint(), Some(10));
        let text = std::str::from_utf8(inner[2].as_bytes().unwrap()).unwrap();
        assert!(text.starts_with("\nhello"));
        assert_eq!(text.lines().skip(1).count(), 10);
    }

    #[test]
    fn test_marker_payload() {
        let payload = Command::MidStreamMarker.encode_payload(Some(0x1F)).unwrap();
        assert_eq!(
            payload,
            vec![0x08, 0xFF, 0x01, 0x10, 0x1F, 0x6A, 0x04, 0x08, 0x00, 0x10, 0x06]
        );
    }

    #[test]
    fn test_sync_trigger_payload() {
        assert_eq!(
            Command::SyncTrigger.encode_payload(None).unwrap(),
            vec![0x08, 0x0E, 0x6A, 0x00]
        );
        assert_eq!(Command::SyncTrigger.service_id(), ServiceId::AUTH_CONTROL);
    }

    #[test]
    fn test_gesture_config_mask() {
        let cmd = Command::GestureConfig {
            enabled: true,
            gestures: vec![GestureKind::Tap, GestureKind::LongPress],
        };
        let payload = cmd.encode_payload(Some(0x30)).unwrap();
        assert_eq!(
            payload,
            vec![0x08, 0x07, 0x10, 0x30, 0x42, 0x04, 0x08, 0x01, 0x10, 0x11]
        );
    }

    #[test]
    fn test_invalid_commands_fail_fast() {
        let empty = Command::ContentPage {
            page_index: 0,
            lines: vec![],
        };
        assert!(matches!(empty.encode_payload(Some(1)), Err(ProtocolError::InvalidCommand(_))));

        let wide = Command::ContentPage {
            page_index: 0,
            lines: vec!["x".repeat(26)],
        };
        assert!(wide.validate().is_err());

        let init = Command::TeleprompterInit {
            total_lines: 0,
            mode: ScrollMode::Auto,
        };
        assert!(init.validate().is_err());
    }

    #[test]
    fn test_message_id_usage() {
        assert!(!Command::DisplayWake.uses_message_id());
        assert!(!Command::SyncTrigger.uses_message_id());
        assert!(Command::DisplayConfig.uses_message_id());
        assert!(Command::MidStreamMarker.uses_message_id());
    }

    #[test]
    fn test_plan_inserts_marker_after_page_nine() {
        let commands = teleprompter_plan("short", ScrollMode::Manual);
        // wake, config, init, 14 pages, marker, complete, sync
        assert_eq!(commands.len(), 3 + 14 + 1 + 2);
        assert_eq!(commands[0], Command::DisplayWake);
        assert_eq!(
            commands[2],
            Command::TeleprompterInit {
                total_lines: 140,
                mode: ScrollMode::Manual
            }
        );
        assert!(matches!(commands[12], Command::ContentPage { page_index: 9, .. }));
        assert_eq!(commands[13], Command::MidStreamMarker);
        assert!(matches!(commands[14], Command::ContentPage { page_index: 10, .. }));
        assert_eq!(commands.last(), Some(&Command::SyncTrigger));
    }
}
