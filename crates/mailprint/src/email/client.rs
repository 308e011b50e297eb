//! IMAP client for the polled mailbox.

use std::future::Future;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::config::MailboxConfig;
use crate::error::ConfigError;

use super::error::{MailboxError, Result};
use super::parser::ParsedMessage;
use super::transport::{MailboxTransport, MessageRef};

/// Type alias for the underlying async stream (async-io wrapped std TcpStream).
type AsyncTcpStream = async_io::Async<TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// An authenticated IMAP session. Closed by [`ImapClient::disconnect`].
pub struct ImapSession {
    inner: Session<TlsStream>,
    logged_out: bool,
}

impl Drop for ImapSession {
    fn drop(&mut self) {
        if !self.logged_out {
            warn!("IMAP session dropped without logout - connection will be closed");
        }
    }
}

/// IMAP-over-TLS implementation of [`MailboxTransport`].
pub struct ImapClient {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    folder: String,
    timeout: Duration,
}

impl ImapClient {
    /// Creates a client from the mailbox settings, resolving the password.
    pub fn new(config: &MailboxConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password()?,
            folder: config.folder.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Runs one IMAP step under the configured timeout.
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| {
                MailboxError::Timeout(format!(
                    "{} did not complete within {}s",
                    operation,
                    self.timeout.as_secs()
                ))
            })?
    }

    async fn open_session(&self) -> Result<ImapSession> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("Connecting to IMAP server at {}", addr);

        // Resolution and connect block, so they run off the runtime thread.
        let (host, port, timeout) = (self.host.clone(), self.port, self.timeout);
        let std_stream = tokio::task::spawn_blocking(move || connect_tcp(&host, port, timeout))
            .await
            .map_err(|e| MailboxError::ConnectionFailed(format!("connect task failed: {}", e)))??;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| MailboxError::ConnectionFailed(e.to_string()))?;
        let tcp_stream =
            async_io::Async::new(std_stream).map_err(|e| MailboxError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = tls
            .connect(&self.host, tcp_stream)
            .await?;

        let client = async_imap::Client::new(tls_stream);

        let session = client
            .login(&self.username, self.password.expose_secret())
            .await
            .map_err(|(e, _)| match e {
                async_imap::error::Error::No(_) | async_imap::error::Error::Bad(_) => {
                    MailboxError::AuthenticationFailed(e.to_string())
                }
                other => MailboxError::ConnectionFailed(other.to_string()),
            })?;

        info!("Authenticated to {} as {}", self.host, self.username);
        Ok(ImapSession {
            inner: session,
            logged_out: false,
        })
    }

    /// Selects the configured folder and returns its message count.
    async fn select_folder(&self, session: &mut ImapSession) -> Result<u32> {
        let mailbox = session
            .inner
            .select(&self.folder)
            .await
            .map_err(|e| folder_error(&self.folder, e))?;

        debug!("Folder '{}' has {} messages", self.folder, mailbox.exists);
        Ok(mailbox.exists)
    }
}

#[async_trait]
impl MailboxTransport for ImapClient {
    type Session = ImapSession;

    async fn connect(&self) -> Result<ImapSession> {
        self.bounded("connect", self.open_session()).await
    }

    async fn list_unread(&self, session: &mut ImapSession) -> Result<Vec<MessageRef>> {
        self.bounded("select", self.select_folder(session)).await?;

        let search = self
            .bounded("search", async {
                session
                    .inner
                    .uid_search("UNSEEN")
                    .await
                    .map_err(MailboxError::from)
            })
            .await;

        let mut uids: Vec<u32> = match search {
            Ok(uids) => uids.into_iter().collect(),
            Err(e) => {
                warn!("UNSEEN search in '{}' failed: {}", self.folder, e);
                return Ok(Vec::new());
            }
        };
        uids.sort_unstable();

        debug!("Found {} unseen messages in '{}'", uids.len(), self.folder);
        Ok(uids
            .into_iter()
            .map(|uid| MessageRef {
                uid,
                folder: self.folder.clone(),
            })
            .collect())
    }

    async fn fetch(&self, session: &mut ImapSession, message: &MessageRef) -> Result<ParsedMessage> {
        let uid = message.uid;
        debug!("Fetching email with UID {}", uid);

        // BODY[] (not BODY.PEEK[]) so the message is marked seen once fetched.
        let fetches = self
            .bounded("fetch", async {
                session
                    .inner
                    .uid_fetch(uid.to_string(), "BODY[]")
                    .await
                    .map_err(|e| MailboxError::FetchFailed {
                        uid,
                        reason: e.to_string(),
                    })?
                    .try_collect::<Vec<_>>()
                    .await
                    .map_err(|e| MailboxError::FetchFailed {
                        uid,
                        reason: e.to_string(),
                    })
            })
            .await?;

        let raw = fetches
            .iter()
            .find(|f| f.uid == Some(uid))
            .or_else(|| fetches.first())
            .and_then(|f| f.body())
            .filter(|body| !body.is_empty())
            .ok_or_else(|| MailboxError::FetchFailed {
                uid,
                reason: "server returned no message body".to_string(),
            })?;

        ParsedMessage::parse(raw)
    }

    async fn purge_all(&self, session: &mut ImapSession) -> Result<()> {
        let exists = self.bounded("select", self.select_folder(session)).await?;
        if exists == 0 {
            debug!("Folder '{}' is empty, nothing to purge", self.folder);
            return Ok(());
        }

        self.bounded("purge", async {
            session
                .inner
                .store("1:*", "+FLAGS (\\Deleted)")
                .await
                .map_err(MailboxError::from)?
                .try_collect::<Vec<_>>()
                .await
                .map_err(MailboxError::from)?;

            session
                .inner
                .expunge()
                .await
                .map_err(MailboxError::from)?
                .try_collect::<Vec<_>>()
                .await
                .map_err(MailboxError::from)
        })
        .await?;

        info!("Purged {} messages from '{}'", exists, self.folder);
        Ok(())
    }

    async fn list_folders(&self, session: &mut ImapSession) -> Result<Vec<String>> {
        let names = self
            .bounded("list", async {
                session
                    .inner
                    .list(Some(""), Some("*"))
                    .await
                    .map_err(MailboxError::from)?
                    .try_collect::<Vec<_>>()
                    .await
                    .map_err(MailboxError::from)
            })
            .await?;

        Ok(names.iter().map(|n| n.name().to_string()).collect())
    }

    async fn disconnect(&self, mut session: ImapSession) {
        info!("Disconnecting from IMAP server");
        let result = self
            .bounded("logout", async {
                session
                    .inner
                    .logout()
                    .await
                    .map_err(MailboxError::from)
            })
            .await;
        if let Err(e) = result {
            debug!("Logout failed (ignored): {}", e);
        }
        session.logged_out = true;
    }
}

/// Shortest connect attempt granted to one address.
const MIN_ATTEMPT: Duration = Duration::from_millis(100);

/// Opens a TCP connection, trying every resolved address in turn. The whole
/// loop shares one `timeout`, split evenly over the addresses not yet tried.
fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let deadline = Instant::now() + timeout;
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| MailboxError::ConnectionFailed(format!("cannot resolve {}: {}", host, e)))?
        .collect();

    let mut last_error = None;
    for (tried, addr) in addrs.iter().enumerate() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(MailboxError::Timeout(format!(
                "connecting to {}:{} took longer than {}s",
                host,
                port,
                timeout.as_secs()
            )));
        }

        match TcpStream::connect_timeout(addr, attempt_budget(remaining, addrs.len() - tried)) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connecting to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(MailboxError::ConnectionFailed(match last_error {
        Some(e) => format!("{}:{}: {}", host, port, e),
        None => format!("no addresses found for {}", host),
    }))
}

/// Share of `remaining` for the next of `attempts_left` addresses. Never
/// zero while time remains, never more than what remains.
fn attempt_budget(remaining: Duration, attempts_left: usize) -> Duration {
    let attempts = u32::try_from(attempts_left.max(1)).unwrap_or(u32::MAX);
    (remaining / attempts).max(MIN_ATTEMPT).min(remaining)
}
