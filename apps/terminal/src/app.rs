//! # Cashier Loop
//!
//! Feeds parsed commands to a [`PosSession`] and prints the result.
//!
//! ## Event Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          tokio::select!                                 │
//! │                                                                         │
//! │   stdin line ──► commands::parse ──► App::handle ──► print              │
//! │        (awaits finalize / close in place: nothing else runs)            │
//! │                                                                         │
//! │   'sync' ──► tokio::spawn(StockSync::fetch) ──► mpsc ──┐                │
//! │                                                         │               │
//! │   sync result ◄─────────────────────────────────────────┘               │
//! │        └──► PosSession::apply_stock_sync                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failed Opens
//! A rejected or timed-out `open` is not proof that no shift exists: the
//! entry may have been created before the reply was lost, or another
//! terminal opened one. The app asks the backend again and adopts whatever
//! shift it reports. `status` on a closed till does the same.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use minimart_backend::BackendError;
use minimart_core::{CatalogItem, LineChange, Quantity, ShiftState};
use minimart_session::{PosSession, SessionError, SessionResult};

use crate::commands::{self, Command, HELP};
use crate::render;

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    session: PosSession,
    sync_tx: mpsc::Sender<SessionResult<Vec<CatalogItem>>>,
    sync_rx: mpsc::Receiver<SessionResult<Vec<CatalogItem>>>,
    sync_pending: bool,
}

impl App {
    pub fn new(session: PosSession) -> Self {
        let (sync_tx, sync_rx) = mpsc::channel(1);
        App {
            session,
            sync_tx,
            sync_rx,
            sync_pending: false,
        }
    }

    pub fn session(&self) -> &PosSession {
        &self.session
    }

    /// Resumes an open shift if there is one and prints where we are.
    pub async fn start(&mut self) -> String {
        match self.session.start().await {
            Ok(_) => render::shift(self.session.settings(), self.session.till().shift_state()),
            Err(e) => render::error(&e),
        }
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run<R>(&mut self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let (flow, output) = self.handle_line(&line).await;
                    if !output.is_empty() {
                        println!("{output}");
                    }
                    if flow == Flow::Quit {
                        break;
                    }
                }
                Some(result) = self.sync_rx.recv() => {
                    println!("{}", self.finish_sync(result));
                }
            }
        }

        info!(session = %self.session.id(), "Terminal loop finished");
        Ok(())
    }

    pub async fn handle_line(&mut self, line: &str) -> (Flow, String) {
        match commands::parse(line) {
            Ok(Some(command)) => self.handle(command).await,
            Ok(None) => (Flow::Continue, String::new()),
            Err(e) => (Flow::Continue, e.to_string()),
        }
    }

    pub async fn handle(&mut self, command: Command) -> (Flow, String) {
        debug!(session = %self.session.id(), ?command, "Command");
        match command {
            Command::Quit => (Flow::Quit, String::new()),
            other => {
                let output = self.execute(other).await.unwrap_or_else(|e| render::error(&e));
                (Flow::Continue, output)
            }
        }
    }

    async fn execute(&mut self, command: Command) -> SessionResult<String> {
        let settings = self.session.settings().clone();

        let output = match command {
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
            Command::Status => {
                if matches!(self.session.till().shift_state(), ShiftState::Closed) {
                    self.session.resume().await?;
                }
                render::shift(&settings, self.session.till().shift_state())
            }
            Command::Open(amount) => {
                let opened = self.session.open_shift(amount).await.map(|_| ());
                match opened {
                    Ok(()) => render::shift(&settings, self.session.till().shift_state()),
                    Err(SessionError::ShiftCreation(e)) => self.recheck_after_failed_open(e).await?,
                    Err(e) => return Err(e),
                }
            }
            Command::Close => {
                let closed = self.session.close_shift().await?;
                let mut out = render::shift(&settings, self.session.till().shift_state());
                if closed.abandoned_lines > 0 {
                    out.push_str(&format!("\n{} cart line(s) abandoned", closed.abandoned_lines));
                }
                out
            }
            Command::Products(keyword) => {
                let till = self.session.till();
                match keyword {
                    Some(keyword) => render::products(&settings, till, till.search(&keyword)),
                    None => render::products(&settings, till, till.catalog()),
                }
            }
            Command::Sync => self.start_sync(),
            Command::Scan(barcode) => {
                self.session.scan(&barcode).await?;
                self.cart_view()
            }
            Command::Add(item_code) => {
                self.session.add_item(&item_code)?;
                self.cart_view()
            }
            Command::Cart => self.cart_view(),
            Command::Increment(index) => {
                self.session.update_quantity(index, Quantity::ONE)?;
                self.cart_view()
            }
            Command::Decrement(index) => {
                self.session.update_quantity(index, -Quantity::ONE)?;
                self.cart_view()
            }
            Command::Quantity { index, input } => {
                if let LineChange::Removed(line) = self.session.set_quantity_text(index, &input)? {
                    debug!(item_code = %line.item_code, "Line removed by quantity edit");
                }
                self.cart_view()
            }
            Command::Remove(index) => {
                self.session.remove_line(index)?;
                self.cart_view()
            }
            Command::Pay {
                tendered,
                method,
                customer,
            } => {
                let sale = self
                    .session
                    .finalize(tendered, method.as_deref(), customer.as_deref())
                    .await?;
                render::sale(&settings, &sale)
            }
            Command::Recent => render::recent(&settings, self.session.recent_invoices()),
            Command::Refresh => {
                let invoices = self.session.refresh_recent().await?;
                render::recent(&settings, invoices)
            }
            Command::Void(invoice) => {
                let released = self.session.void(&invoice).await?;
                format!("{} voided, {} unit(s) back in stock", invoice.trim(), released)
            }
            Command::Receipt => match self.session.receipt() {
                Some(receipt) => render::receipt(&settings, &receipt),
                None => "No sale to reprint".to_string(),
            },
        };

        Ok(output)
    }

    /// Re-queries the backend after `open_shift` failed and adopts a shift
    /// that turns out to be open. Without one, the original error stands.
    async fn recheck_after_failed_open(&mut self, error: BackendError) -> SessionResult<String> {
        let session = self.session.id();
        warn!(session = %session, error = %error, "Open failed, re-checking shift status");

        let adopted = self
            .session
            .resume()
            .await
            .map(|shift| shift.map(|s| s.opening_entry_id.clone()));

        match adopted {
            Ok(Some(opening_entry)) => {
                info!(session = %session, ?opening_entry, "Adopted shift after failed open");
                let failure = render::error(&SessionError::ShiftCreation(error));
                let state = render::shift(self.session.settings(), self.session.till().shift_state());
                Ok(format!("{failure}\n{state}"))
            }
            Ok(None) => Err(SessionError::ShiftCreation(error)),
            Err(recheck) => {
                warn!(session = %session, error = %recheck, "Shift status re-check failed");
                Err(SessionError::ShiftCreation(error))
            }
        }
    }

    fn cart_view(&self) -> String {
        render::cart(self.session.settings(), self.session.till().cart())
    }

    /// Starts a background catalog fetch. Scanning continues meanwhile.
    fn start_sync(&mut self) -> String {
        if self.sync_pending {
            return "Stock sync already running".to_string();
        }

        let sync = self.session.stock_sync();
        let tx = self.sync_tx.clone();
        tokio::spawn(async move {
            let result = sync.fetch().await;
            if tx.send(result).await.is_err() {
                warn!("Stock sync finished after the terminal loop ended");
            }
        });

        self.sync_pending = true;
        "Stock sync started".to_string()
    }

    fn finish_sync(&mut self, result: SessionResult<Vec<CatalogItem>>) -> String {
        self.sync_pending = false;
        match result {
            Ok(items) => {
                let count = items.len();
                self.session.apply_stock_sync(items);
                format!("Stock synced ({count} items)")
            }
            Err(e) => render::error(&e),
        }
    }

    /// Waits for the outstanding stock sync, if any, and applies it.
    pub async fn wait_for_sync(&mut self) -> Option<String> {
        if !self.sync_pending {
            return None;
        }
        let result = self.sync_rx.recv().await?;
        Some(self.finish_sync(result))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
