use model::Venue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("expected exactly one symbol argument, got {0}")]
    WrongArgumentCount(usize),

    #[error("symbol must not be empty")]
    EmptySymbol,
}

/// Extract the single positional symbol, upper-cased.
///
/// `args` excludes the program name.
pub fn parse_symbol<I>(args: I) -> Result<String, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();

    match args.as_slice() {
        [symbol] => {
            let symbol = symbol.trim();
            if symbol.is_empty() {
                Err(UsageError::EmptySymbol)
            } else {
                Ok(symbol.to_uppercase())
            }
        }
        _ => Err(UsageError::WrongArgumentCount(args.len())),
    }
}

/// Usage text printed on a bad command line.
pub fn usage(program: &str, venue: Venue) -> String {
    let examples: &[&str] = match venue {
        Venue::Coinbase => &["BTCUSDT", "ETHUSDT"],
        Venue::Kraken => &["BTCUSDT", "ETHUSD", "XBTUSD"],
    };

    let mut text = format!("Usage: {} <SYMBOL>\nExamples:\n", program);
    for example in examples {
        text.push_str(&format!("  {} {}\n", program, example));
    }
    text
}
