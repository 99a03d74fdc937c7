pub mod content;
pub mod recruitment;
pub mod team;
