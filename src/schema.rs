table! {
    attributes (id) {
        id -> Int4,
        category_id -> Int4,
        key -> Varchar,
        label -> Varchar,
        value_type -> Varchar,
        options -> Array<Text>,
        min_number -> Nullable<Float8>,
        max_number -> Nullable<Float8>,
        is_required -> Bool,
    }
}

table! {
    categories (id) {
        id -> Int4,
        parent_id -> Nullable<Int4>,
        slug -> Varchar,
        name -> Varchar,
    }
}

table! {
    listing_attribute_values (id) {
        id -> Int4,
        listing_id -> Int4,
        attribute_id -> Int4,
        value_text -> Nullable<Varchar>,
        value_number -> Nullable<Float8>,
        value_bool -> Nullable<Bool>,
        value_option_key -> Nullable<Varchar>,
    }
}

table! {
    listings (id) {
        id -> Int4,
        user_id -> Int4,
        category_id -> Int4,
        location_id -> Nullable<Int4>,
        title -> Varchar,
        description -> Text,
        price_amount -> Nullable<Float8>,
        price_currency -> Varchar,
        condition -> Varchar,
        status -> Varchar,
        lat -> Nullable<Float8>,
        lon -> Nullable<Float8>,
        created_at -> Timestamp,
        refreshed_at -> Timestamp,
    }
}

table! {
    locations (id) {
        id -> Int4,
        parent_id -> Nullable<Int4>,
        slug -> Varchar,
        name -> Varchar,
    }
}

joinable!(attributes -> categories (category_id));
joinable!(listing_attribute_values -> attributes (attribute_id));
joinable!(listing_attribute_values -> listings (listing_id));
joinable!(listings -> categories (category_id));
joinable!(listings -> locations (location_id));

allow_tables_to_appear_in_same_query!(
    attributes,
    categories,
    listing_attribute_values,
    listings,
    locations,
);
