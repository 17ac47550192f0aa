/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連するすべての機能を提供します：
/// - サブスクリプションの作成、取得、部分更新、削除
/// - user_id / service_name による一覧取得
/// - API境界の年月文字列と内部日付の変換
pub mod dates;
pub mod handlers;
pub mod models;
pub mod repository;


// 公開インターフェース
pub use handlers::{
    create_subscription, delete_subscription, get_subscription, list_subscriptions,
    update_subscription,
};

pub use models::{
    CreateSubscriptionDto, ListFilter, Subscription, SubscriptionResponse, UpdateSubscriptionDto,
};

pub use repository::{create, delete, find_all, find_by_id, update};
