//! 차트 감시 도메인 모델.

mod analysis;
mod breakout;
mod extrema;
mod levels;
mod market_data;
mod pattern;
mod provider;

pub use analysis::*;
pub use breakout::*;
pub use extrema::*;
pub use levels::*;
pub use market_data::*;
pub use pattern::*;
pub use provider::*;
