//! Interactive conversion session.

use std::sync::Arc;

use obmin_common::CurrencyCode;
use obmin_rates::{ConversionEngine, ConversionResult, Debouncer, RateStore};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// One user trigger, parsed from an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free-text amount input.
    Amount(String),
    /// Change the from-currency selection.
    From(String),
    /// Change the to-currency selection.
    To(String),
    /// Manual calculate trigger.
    Calc,
    /// Exchange the two selections.
    Swap,
    /// Clear input and restore default selections.
    Reset,
    /// Emit the last computed result as plain text.
    Copy,
    /// Toggle debounced auto-calculation.
    Auto(bool),
    /// Report the auto-calculation state (missing or unrecognized toggle
    /// argument; never changes the setting).
    AutoStatus,
    /// List known currencies.
    List,
    Help,
    Quit,
}

impl Command {
    /// Parse an input line. Blank lines parse to nothing; anything that is
    /// not a known command word is treated as amount input.
    pub fn parse(line: &str) -> Option<Command> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut words = trimmed.split_whitespace();
        let head = words.next()?.to_lowercase();
        let rest = words.next().unwrap_or_default();

        let command = match head.as_str() {
            "from" => Command::From(rest.to_string()),
            "to" => Command::To(rest.to_string()),
            "calc" => Command::Calc,
            "swap" => Command::Swap,
            "reset" => Command::Reset,
            "copy" => Command::Copy,
            "auto" => match rest.to_lowercase().as_str() {
                "on" => Command::Auto(true),
                "off" => Command::Auto(false),
                _ => Command::AutoStatus,
            },
            "list" => Command::List,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Amount(trimmed.to_string()),
        };

        Some(command)
    }
}

/// Interactive session state: the two selections, the amount input, the
/// auto-calculation toggle, and the last displayed result.
pub struct Session {
    engine: Arc<ConversionEngine>,
    store: Arc<RateStore>,
    from: CurrencyCode,
    to: CurrencyCode,
    amount: String,
    auto: bool,
    last_result: Arc<Mutex<Option<ConversionResult>>>,
    debouncer: Debouncer,
}

impl Session {
    /// Create a session over a populated store.
    pub fn new(store: Arc<RateStore>, auto: bool) -> Self {
        let (from, to) = Self::default_selection(&store);

        Self {
            engine: Arc::new(ConversionEngine::new(store.clone())),
            store,
            from,
            to,
            amount: String::new(),
            auto,
            last_result: Arc::new(Mutex::new(None)),
            debouncer: Debouncer::standard(),
        }
    }

    /// Default selections: US dollar (when known) against the base.
    fn default_selection(store: &RateStore) -> (CurrencyCode, CurrencyCode) {
        let usd = CurrencyCode::usd();
        let from = if store.entry(&usd).is_some() {
            usd
        } else {
            CurrencyCode::uah()
        };
        (from, CurrencyCode::uah())
    }

    /// Current from-currency selection.
    pub fn from(&self) -> &CurrencyCode {
        &self.from
    }

    /// Current to-currency selection.
    pub fn to(&self) -> &CurrencyCode {
        &self.to
    }

    /// Whether auto-calculation is enabled.
    pub fn auto(&self) -> bool {
        self.auto
    }

    /// Current amount input.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    /// Run the interactive loop until quit or end of input.
    pub async fn run(mut self) -> anyhow::Result<()> {
        println!(
            "Exchange rates as of {}; {} currencies known. Type `help` for commands.",
            display_or_unknown(&self.store.published_date()),
            self.store.codes().len()
        );
        self.print_selection();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            if !self.handle(command) {
                break;
            }
        }

        Ok(())
    }

    /// Apply one command. Returns `false` when the session should end.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Amount(raw) => {
                self.amount = raw;
                self.auto_recalculate();
            }
            Command::From(code) => {
                self.from = CurrencyCode::new(code);
                self.auto_recalculate();
            }
            Command::To(code) => {
                self.to = CurrencyCode::new(code);
                self.auto_recalculate();
            }
            Command::Calc => self.calculate(),
            Command::Swap => {
                std::mem::swap(&mut self.from, &mut self.to);
                self.print_selection();
                self.auto_recalculate();
            }
            Command::Reset => {
                let (from, to) = Self::default_selection(&self.store);
                self.from = from;
                self.to = to;
                self.amount.clear();
                self.debouncer.cancel();
                *self.last_result.lock() = None;
                self.print_selection();
            }
            Command::Copy => match self.last_result.lock().as_ref() {
                Some(result) => println!("{}", render_plain(result)),
                None => println!("Nothing computed yet."),
            },
            Command::Auto(enabled) => {
                self.auto = enabled;
                if !enabled {
                    self.debouncer.cancel();
                }
                println!("Auto-calculation {}.", if enabled { "on" } else { "off" });
            }
            Command::AutoStatus => {
                println!(
                    "Auto-calculation is {}. Use `auto on` or `auto off`.",
                    if self.auto { "on" } else { "off" }
                );
            }
            Command::List => self.print_currencies(),
            Command::Help => print_help(),
            Command::Quit => return false,
        }
        true
    }

    /// Manual calculation: errors are shown to the user.
    fn calculate(&mut self) {
        match self
            .engine
            .convert_text(&self.amount, self.from.clone(), self.to.clone())
        {
            Ok(result) => {
                println!("{}", render_result(&result));
                *self.last_result.lock() = Some(result);
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    /// Debounced recalculation: errors are suppressed and the previous
    /// result stays displayed.
    fn auto_recalculate(&mut self) {
        if !self.auto {
            return;
        }

        let engine = self.engine.clone();
        let last_result = self.last_result.clone();
        let raw = self.amount.clone();
        let from = self.from.clone();
        let to = self.to.clone();

        self.debouncer.schedule(async move {
            match engine.convert_text(&raw, from, to) {
                Ok(result) => {
                    println!("{}", render_result(&result));
                    *last_result.lock() = Some(result);
                }
                Err(e) => debug!(error = %e, "Suppressed auto-calculation error"),
            }
        });
    }

    fn print_selection(&self) {
        println!("Converting {} → {}.", self.from, self.to);
    }

    fn print_currencies(&self) {
        for code in self.store.codes() {
            if let Some(entry) = self.store.entry(&code) {
                println!("{}  {}  {}", entry.code, format_amount(entry.rate), entry.display_name);
            }
        }
    }
}

/// Format an amount for display: at most two fraction digits, no
/// trailing zeros.
pub fn format_amount(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

/// Result line plus the derivation trail.
pub fn render_result(result: &ConversionResult) -> String {
    let mut out = render_plain(result);
    for line in result.trail() {
        out.push_str("\n  ");
        out.push_str(&line);
    }
    out
}

/// The last computed result as plain copyable text.
pub fn render_plain(result: &ConversionResult) -> String {
    format!(
        "{} {} = {} {}",
        format_amount(result.amount),
        result.from,
        format_amount(result.converted),
        result.to
    )
}

fn display_or_unknown(date: &str) -> &str {
    if date.is_empty() {
        "an unknown date"
    } else {
        date
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <amount>      set the amount (e.g. 100 or 10,5)");
    println!("  from <code>   change the from-currency");
    println!("  to <code>     change the to-currency");
    println!("  calc          calculate now");
    println!("  swap          exchange the two selections");
    println!("  reset         clear input and restore defaults");
    println!("  copy          print the last result as plain text");
    println!("  auto on|off   toggle debounced auto-calculation");
    println!("  list          list known currencies");
    println!("  quit          leave");
}
