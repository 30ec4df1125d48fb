pub mod wallet;

pub use wallet::WalletEngine;
