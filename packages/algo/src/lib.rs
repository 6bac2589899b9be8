//! # spelling-algo - 拼写练习核心算法库
//!
//! Pure Rust building blocks for the spelling-practice engine:
//!
//! - **Correctness** - case- and padding-insensitive answer checking
//! - **Points** - base points, pool bonus with half-up rounding
//! - **Mastery** - the struggling/mastered state machine per user and word
//! - **Practice set** - mistake-weighted, shuffled session building
//! - **Shuffle** - Fisher-Yates with an injectable generator
//!
//! Nothing here touches storage; the `spelling-engine` crate reads and writes
//! records and feeds them through these functions.
//!
//! ## 使用示例
//!
//! ```rust
//! use spelling_algo::{build_session, is_correct, points, Word};
//!
//! assert!(is_correct(" Fiets ", "fiets"));
//! assert_eq!(points(true, 10, true), 15);
//!
//! let words = vec![Word {
//!     id: "w1".into(),
//!     list_id: "l1".into(),
//!     text: "fiets".into(),
//!     explanation: String::new(),
//!     source_word_id: None,
//! }];
//! assert_eq!(build_session(&words, &[], 10).len(), 1);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod correctness;
pub mod mastery;
pub mod points;
pub mod practice_set;
pub mod sanitize;
pub mod shuffle;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

pub use types::*;

pub use correctness::{is_correct, normalize};
pub use mastery::{apply_attempt, MasteryPolicy, MasteryTransition, PoolEffect};
pub use points::points;
pub use practice_set::{build_session, build_session_with, extra_occurrences, weighted_pool};
pub use sanitize::ValidationError;
pub use shuffle::{shuffle, shuffle_in_place, shuffle_with};
