//! Playbook Sequencer
//!
//! 플레이북 아이템/스텝 편집, 애니메이션 재생, 모션 트레일.

pub mod scheduler;
pub mod sequencer;
pub mod trails;

pub use scheduler::{Scheduler, TimerHandle, TimerQueue};
