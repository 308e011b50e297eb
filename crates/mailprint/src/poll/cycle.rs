use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::email::{
    extract_first_attachment, ExtractedAttachment, ImapClient, MailboxTransport, MessageRef,
};
use crate::print::{CupsClient, PrintDispatcher, PrintOutcome, PrintService};
use crate::storage::AttachmentStore;

use super::report::{PrintAttempt, TickReport, TickState};

/// The parts of the configuration the cycle acts on.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub keyword: Option<String>,
    pub delete_after_read: bool,
    pub queue: String,
    pub job_label: String,
    pub poll_interval: Duration,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keyword: config.mailbox.keyword().map(str::to_string),
            delete_after_read: config.mailbox.delete_after_read,
            queue: config.printer.name.clone(),
            job_label: config.printer.job_label.clone(),
            poll_interval: config.mailbox.poll_interval(),
        }
    }
}

/// Drives the mailbox, store and printer through one tick at a time.
pub struct PollCycle<M, P> {
    settings: CycleSettings,
    mailbox: M,
    dispatcher: PrintDispatcher<P>,
    store: AttachmentStore,
}

impl<M, P> PollCycle<M, P>
where
    M: MailboxTransport,
    P: PrintService,
{
    pub fn new(
        settings: CycleSettings,
        mailbox: M,
        dispatcher: PrintDispatcher<P>,
        store: AttachmentStore,
    ) -> Self {
        Self {
            settings,
            mailbox,
            dispatcher,
            store,
        }
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn dispatcher(&self) -> &PrintDispatcher<P> {
        &self.dispatcher
    }

    /// Runs ticks until `shutdown` resolves. Shutdown is only observed
    /// between ticks; a tick in progress always runs to completion.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "Starting poll loop"
        );

        loop {
            self.run_contained_tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving poll loop");
                    break;
                }
            }
        }
    }

    /// Runs one tick, also containing panics so the loop can go on.
    async fn run_contained_tick(&self) -> Option<TickReport> {
        match AssertUnwindSafe(self.run_tick()).catch_unwind().await {
            Ok(report) => {
                log_summary(&report);
                Some(report)
            }
            Err(_) => {
                error!("Tick aborted by a panic; the next tick starts fresh");
                None
            }
        }
    }

    /// Runs one complete tick. Never fails: every error is logged and
    /// recorded in the returned report.
    pub async fn run_tick(&self) -> TickReport {
        self.tick().instrument(info_span!("poll_tick")).await
    }

    async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        report.enter(TickState::Connecting);
        let mut session = match self.mailbox.connect().await {
            Ok(session) => session,
            Err(e) => {
                error!("Could not connect to mailbox: {}", e);
                report.record_error(e);
                report.enter(TickState::Idle);
                return report;
            }
        };

        report.enter(TickState::Listing);
        let unread = match self.mailbox.list_unread(&mut session).await {
            Ok(unread) => unread,
            Err(e) => {
                error!("Could not list unread messages: {}", e);
                report.record_error(e);
                Vec::new()
            }
        };
        report.unread = unread.len();

        report.enter(TickState::FetchingAndParsing);
        let found = self.find_attachment(&mut session, &unread, &mut report).await;

        if let Some((uid, attachment)) = found {
            report.enter(TickState::Printing);
            report.selected_uid = Some(uid);
            self.print_attachment(&attachment, &mut report).await;
        }

        if self.settings.delete_after_read {
            report.enter(TickState::Purging);
            match self.mailbox.purge_all(&mut session).await {
                Ok(()) => report.purged = true,
                Err(e) => {
                    warn!("Purge failed, will retry next tick: {}", e);
                    report.record_error(e);
                }
            }
        }

        report.enter(TickState::Disconnecting);
        self.mailbox.disconnect(session).await;

        report.enter(TickState::Idle);
        report
    }

    /// Fetches unread messages in order until one yields an attachment.
    /// Later messages are left untouched for the next tick.
    async fn find_attachment(
        &self,
        session: &mut M::Session,
        unread: &[MessageRef],
        report: &mut TickReport,
    ) -> Option<(u32, ExtractedAttachment)> {
        let keyword = self.settings.keyword.as_deref();

        for message_ref in unread {
            report.fetched += 1;

            let message = match self.mailbox.fetch(session, message_ref).await {
                Ok(message) => message,
                Err(e) => {
                    warn!(uid = message_ref.uid, "Skipping message: {}", e);
                    report.record_error(e);
                    continue;
                }
            };

            info!(
                uid = message_ref.uid,
                subject = message.subject.as_deref().unwrap_or("(no subject)"),
                "Checking message"
            );

            if let Some(attachment) = extract_first_attachment(&message, keyword) {
                return Some((message_ref.uid, attachment));
            }
        }

        None
    }

    /// Saves, submits and removes one attachment. The saved file is removed
    /// whatever the submission outcome.
    async fn print_attachment(&self, attachment: &ExtractedAttachment, report: &mut TickReport) {
        let path = match self
            .store
            .save(attachment.filename.as_deref(), &attachment.content)
        {
            Ok(path) => path,
            Err(e) => {
                error!("Could not store attachment: {}", e);
                report.print = Some(PrintAttempt::Failed(e.to_string()));
                report.record_error(e);
                return;
            }
        };

        let result = self
            .dispatcher
            .submit(&self.settings.queue, &path, &self.settings.job_label)
            .await;

        report.attachment_removed = self.store.remove(&path);

        match result {
            Ok(outcome) => {
                match &outcome {
                    PrintOutcome::Submitted { .. } => info!("Attachment sent to printer"),
                    PrintOutcome::QueueNotFound | PrintOutcome::NotPrintable => {
                        warn!(?outcome, "Attachment not printed")
                    }
                }
                report.print = Some(PrintAttempt::Completed(outcome));
            }
            Err(e) => {
                error!("Print submission failed: {}", e);
                report.print = Some(PrintAttempt::Failed(e.to_string()));
                report.record_error(e);
            }
        }
    }
}

fn log_summary(report: &TickReport) {
    if report.errors.is_empty() {
        debug!(
            unread = report.unread,
            fetched = report.fetched,
            printed = report.printed(),
            purged = report.purged,
            "Tick finished"
        );
    } else {
        warn!(
            unread = report.unread,
            fetched = report.fetched,
            printed = report.printed(),
            errors = report.errors.len(),
            "Tick finished with errors"
        );
    }
}

impl PollCycle<ImapClient, CupsClient> {
    /// Wires the IMAP and CUPS clients from a validated configuration.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let mailbox = ImapClient::new(&config.mailbox)?;
        let printer =
            CupsClient::new(config.printer.host.clone()).with_timeout(config.mailbox.timeout());

        Ok(Self::new(
            CycleSettings::from_config(config),
            mailbox,
            PrintDispatcher::new(printer),
            AttachmentStore::new(&config.storage.directory),
        ))
    }
}
