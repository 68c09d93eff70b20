//! 감시 목록 저장소.
//!
//! 추가/삭제/조회는 단일 배타 잠금으로 보호됩니다.
//! 분석 패스는 시작 시 `snapshot()`으로 복사본을 받아 사용하므로
//! 패스 도중의 편집은 다음 패스부터 반영됩니다.

use chartwatch_core::WatchSymbol;
use tokio::sync::Mutex;

/// `Watchlist::add` 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyTracked,
}

/// 감시 목록.
#[derive(Debug, Default)]
pub struct Watchlist {
    symbols: Mutex<Vec<WatchSymbol>>,
}

impl Watchlist {
    pub fn new(symbols: impl IntoIterator<Item = WatchSymbol>) -> Self {
        let mut unique: Vec<WatchSymbol> = Vec::new();
        for symbol in symbols {
            if !unique.iter().any(|s| s.symbol == symbol.symbol) {
                unique.push(symbol);
            }
        }
        Self {
            symbols: Mutex::new(unique),
        }
    }

    /// 심볼을 추가합니다. 같은 심볼이 이미 있으면 거래소와 관계없이 추가하지 않습니다.
    ///
    /// 결과 캐시와 돌파 테이블이 심볼 문자열을 키로 쓰기 때문입니다.
    pub async fn add(&self, symbol: WatchSymbol) -> AddOutcome {
        let mut symbols = self.symbols.lock().await;
        if symbols.iter().any(|s| s.symbol == symbol.symbol) {
            return AddOutcome::AlreadyTracked;
        }
        symbols.push(symbol);
        AddOutcome::Added
    }

    /// 심볼을 삭제합니다. 삭제했으면 `true`.
    pub async fn remove(&self, symbol: &str) -> bool {
        let mut symbols = self.symbols.lock().await;
        let before = symbols.len();
        symbols.retain(|s| s.symbol != symbol);
        symbols.len() != before
    }

    /// 현재 목록의 복사본.
    pub async fn snapshot(&self) -> Vec<WatchSymbol> {
        self.symbols.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> WatchSymbol {
        WatchSymbol::binance(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates() {
        let list = Watchlist::new([sym("BTC"), sym("BTCUSDT")]);
        assert_eq!(list.snapshot().await.len(), 1);

        assert_eq!(list.add(sym("eth")).await, AddOutcome::Added);
        assert_eq!(list.add(sym("ETHUSDT")).await, AddOutcome::AlreadyTracked);
        assert_eq!(list.snapshot().await, vec![sym("BTC"), sym("ETH")]);
    }

    #[tokio::test]
    async fn test_same_symbol_on_other_exchange_is_tracked_once() {
        let list = Watchlist::new([sym("BTC")]);
        let upbit = WatchSymbol::new("BTCUSDT", "UPBIT").unwrap();

        assert_eq!(list.add(upbit).await, AddOutcome::AlreadyTracked);
        assert_eq!(list.snapshot().await, vec![sym("BTC")]);
    }

    #[tokio::test]
    async fn test_remove_and_snapshot_isolation() {
        let list = Watchlist::new([sym("BTC"), sym("ETH")]);
        let snapshot = list.snapshot().await;

        assert!(list.remove("BTCUSDT").await);
        assert!(!list.remove("BTCUSDT").await);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(list.snapshot().await, vec![sym("ETH")]);
    }
}
