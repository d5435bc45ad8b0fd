diesel::table! {
    feed_subscriptions (id) {
        id -> Integer,
        chat_id -> BigInt,
        title -> Text,
        url -> Text,
        last_checked_at -> Nullable<Timestamp>,
        last_item_id -> Nullable<Text>,
    }
}
