/// サブスクリプション機能
pub mod subscriptions;
