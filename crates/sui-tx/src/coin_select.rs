//! Coin object selection
//!
//! A wallet may hold one balance split across many coin objects. Picks the
//! smallest largest-first set of objects whose sum covers a required amount.

use std::fmt;

// =============================================================================
// Error type
// =============================================================================

/// Error returned when the owned coin objects cannot cover a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinSelectorError {
    Insufficient {
        coin_type: String,
        required: u64,
        available: u64,
    },
}

impl fmt::Display for CoinSelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSelectorError::Insufficient {
                coin_type,
                required,
                available,
            } => write!(
                f,
                "Insufficient {}: need {}, have {}",
                coin_type, required, available
            ),
        }
    }
}

impl std::error::Error for CoinSelectorError {}

// =============================================================================
// Selection
// =============================================================================

/// An owned coin object and its raw balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinRef {
    pub object_id: String,
    pub balance: u64,
}

impl CoinRef {
    pub fn new(object_id: impl Into<String>, balance: u64) -> Self {
        Self {
            object_id: object_id.into(),
            balance,
        }
    }
}

/// Coins chosen to fund one split: `merge` is folded into `primary` first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCoins {
    pub primary: String,
    pub merge: Vec<String>,
    pub total: u64,
}

/// Select the fewest coins (largest first) covering `required`.
pub fn select_coins(
    coins: &[CoinRef],
    coin_type: &str,
    required: u64,
) -> Result<SelectedCoins, CoinSelectorError> {
    let mut sorted: Vec<&CoinRef> = coins.iter().collect();
    sorted.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut chosen: Vec<&CoinRef> = Vec::new();
    let mut total: u64 = 0;

    for coin in sorted {
        if total >= required && !chosen.is_empty() {
            break;
        }
        total = total.saturating_add(coin.balance);
        chosen.push(coin);
    }

    if chosen.is_empty() || total < required {
        return Err(CoinSelectorError::Insufficient {
            coin_type: coin_type.to_string(),
            required,
            available: total,
        });
    }

    let primary = chosen[0].object_id.clone();
    let merge = chosen[1..].iter().map(|c| c.object_id.clone()).collect();

    Ok(SelectedCoins {
        primary,
        merge,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins() -> Vec<CoinRef> {
        vec![
            CoinRef::new("0xa", 30),
            CoinRef::new("0xb", 100),
            CoinRef::new("0xc", 50),
        ]
    }

    #[test]
    fn test_single_coin_suffices() {
        let sel = select_coins(&coins(), "P", 80).unwrap();
        assert_eq!(sel.primary, "0xb");
        assert!(sel.merge.is_empty());
        assert_eq!(sel.total, 100);
    }

    #[test]
    fn test_merges_largest_first() {
        let sel = select_coins(&coins(), "P", 140).unwrap();
        assert_eq!(sel.primary, "0xb");
        assert_eq!(sel.merge, vec!["0xc".to_string()]);
        assert_eq!(sel.total, 150);
    }

    #[test]
    fn test_exact_total() {
        let sel = select_coins(&coins(), "P", 180).unwrap();
        assert_eq!(sel.merge.len(), 2);
        assert_eq!(sel.total, 180);
    }

    #[test]
    fn test_insufficient() {
        let err = select_coins(&coins(), "P", 181).unwrap_err();
        assert_eq!(
            err,
            CoinSelectorError::Insufficient {
                coin_type: "P".into(),
                required: 181,
                available: 180
            }
        );
    }

    #[test]
    fn test_no_coins() {
        assert!(select_coins(&[], "P", 0).is_err());
    }
}
