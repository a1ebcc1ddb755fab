//! # Fukurow EL CLI Library
//!
//! OWL 2 EL 推論エンジンのコマンドラインインターフェース
//! 分類・整合性検査・包含関係の説明をコマンドラインから実行

pub mod commands;
pub mod interactive;

pub use commands::*;
pub use interactive::*;
