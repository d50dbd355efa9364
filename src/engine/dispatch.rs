//! Answering controller requests.

use time::{Date, OffsetDateTime};

use crate::dom::Page;
use crate::export::ExportFormat;
use crate::messaging::{Message, Outcome, PagePort, Response};

use super::Extractor;

impl Extractor {
    /// Handle one controller message.
    pub fn handle(&mut self, page: &mut Page, message: Message) -> Response {
        log::trace!("message: {:?}", message);
        match message {
            Message::ToggleExtractor { state } => {
                self.set_enabled(page, state);
                Response::Ack {}
            }
            Message::GetSelected => {
                let items = self.selected();
                Response::Selection {
                    count: items.len(),
                    items,
                }
            }
            Message::GetStatus => Response::Status {
                count: self.selection_len(),
            },
            Message::RemoveVideo { video_id } => {
                self.remove_video(page, &video_id);
                Response::Ack {}
            }
            Message::ClearSelection => {
                self.clear_selection(page);
                Response::Outcome(Outcome::ok())
            }
            Message::GetExportData { format } => {
                let today = OffsetDateTime::now_utc().date();
                Response::Outcome(self.export_outcome(format, today))
            }
        }
    }

    /// Answer every queued request. Returns how many were handled.
    pub fn pump(&mut self, page: &mut Page, port: &PagePort) -> usize {
        let mut handled = 0;
        while let Some(request) = port.try_next() {
            let response = self.handle(page, request.message.clone());
            request.respond(response);
            handled += 1;
        }
        handled
    }

    /// Export reply with data, filename and MIME type, or the failure reason.
    pub fn export_outcome(&self, format: ExportFormat, date: Date) -> Outcome {
        match self.export(format) {
            Ok(data) => Outcome {
                data: Some(data),
                filename: Some(format.suggested_filename(&date.to_string())),
                mime_type: Some(format.mime_type().to_string()),
                ..Outcome::ok()
            },
            Err(e) => {
                log::debug!("export as {:?} refused: {}", format, e);
                Outcome::failed(e.to_string())
            }
        }
    }
}
