//! Integration tests for declarative search models
//!
//! Covers schema definition, field validation and the validated query session
//! end to end, down to the `$search` / `$searchMeta` stage documents.

use bson::doc;
use ouroboros_mongodb::search::{
    CompoundBuilder, FacetOptions, IndexField, SearchModel, TextClause,
};
use ouroboros_mongodb::{CountType, DataBridgeError, FieldType, SearchOperation};

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn user_search() -> SearchModel {
    SearchModel::builder("UserSearch")
        .index("users")
        .field("name", IndexField::new().with_string_index())
        .field("bio", IndexField::new().with_string_index())
        .field("age", IndexField::new().with_number_index().with_number_facet())
        .field("category", IndexField::new().with_string_facet())
        .build()
        .unwrap()
}

// ============================================================================
// MODEL DEFINITION
// ============================================================================

#[test]
fn test_basic_model_definition() {
    let model = user_search();
    assert_eq!(model.name(), "UserSearch");
    assert_eq!(model.index(), "users");
    assert_eq!(model.get_all_fields().len(), 4);
}

#[test]
fn test_model_with_dotted_paths() {
    let model = SearchModel::builder("MessageSearch")
        .index("messages")
        .fields([
            ("type", IndexField::new().with_string_facet().with_string_index()),
            ("rawData.from", IndexField::new().with_string_facet().with_string_index()),
            ("rawData.to", IndexField::new().with_string_index()),
        ])
        .build()
        .unwrap();

    assert!(model.get_field("rawData.from").is_some());
    assert!(model.get_field("rawData").is_none());
    assert_eq!(
        model.get_field("rawData.to").and_then(IndexField::search_type),
        Some(FieldType::String)
    );
}

#[test]
fn test_searchable_and_facetable_projections() {
    let model = user_search();

    let searchable = model.get_searchable_fields();
    let names: Vec<&str> = searchable.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["name", "bio", "age"]);

    let facetable = model.get_facetable_fields();
    let names: Vec<&str> = facetable.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["age", "category"]);
}

#[test]
fn test_validate_field_errors() {
    let model = user_search();

    assert!(model.validate_field("name", SearchOperation::Search).is_ok());

    let err = model.validate_field("missing", SearchOperation::Search).unwrap_err();
    assert!(err.is_schema_error());
    assert_eq!(err.field(), Some("missing"));
    assert!(matches!(err, DataBridgeError::UndefinedField { ref model, .. } if model == "UserSearch"));

    let err = model.validate_field("category", SearchOperation::Search).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field 'category' is not configured for search operations"
    );
}

#[test]
fn test_model_from_json() {
    let json = r#"{
        "name": "ProductSearch",
        "index": "products",
        "fields": {
            "name": { "stringIndex": true },
            "price.amount": { "number_index": true, "numberFacet": true }
        }
    }"#;
    let model = SearchModel::from_json(json).unwrap();
    assert_eq!(model.index(), "products");
    assert_eq!(
        model.get_field("price.amount"),
        Some(&IndexField::new().with_number_index().with_number_facet())
    );

    let reloaded = SearchModel::from_json(&model.to_json().unwrap()).unwrap();
    assert_eq!(reloaded, model);
}

#[test]
fn test_model_from_json_defaults() {
    let model = SearchModel::from_json(r#"{ "fields": { "title": { "stringIndex": true } } }"#).unwrap();
    assert_eq!(model.index(), "default");
    assert_eq!(model.name(), "SearchModel");
}

#[test]
fn test_model_from_json_errors() {
    let err = SearchModel::from_json("{ not json").unwrap_err();
    assert!(matches!(err, DataBridgeError::Deserialization(_)));

    let err = SearchModel::from_json(r#"{ "fields": { "": { "stringIndex": true } } }"#).unwrap_err();
    assert!(matches!(err, DataBridgeError::Validation(_)));
}

// ============================================================================
// QUERY SESSION
// ============================================================================

#[test]
fn test_text_search() {
    let model = user_search();
    let mut query = model.search();
    query.text("john", "name").unwrap();

    assert_eq!(
        query.build().unwrap(),
        doc! { "index": "users", "text": { "query": "john", "path": "name" } }
    );
}

#[test]
fn test_text_search_with_fuzzy() {
    let model = user_search();
    let mut query = model.search();
    query
        .text_clause(TextClause::new("jonh", "name").fuzzy(doc! { "maxEdits": 2 }))
        .unwrap();

    let search = query.build().unwrap();
    assert_eq!(
        search.get_document("text").unwrap().get_document("fuzzy").unwrap(),
        &doc! { "maxEdits": 2 }
    );
}

#[test]
fn test_text_search_requires_string_index() {
    init_tracing();
    let model = user_search();
    let mut query = model.search();

    let err = query.text("test", "age").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field 'age' must have string_index enabled for text search"
    );
    assert!(query.raw_builder().operator_name().is_none());
}

#[test]
fn test_multi_path_text_validates_every_path() {
    let model = user_search();
    let mut query = model.search();
    let err = query
        .text_clause(TextClause::new("x", ["name", "category"]))
        .unwrap_err();
    assert_eq!(err.field(), Some("category"));
}

#[test]
fn test_phrase_and_autocomplete() {
    let model = user_search();

    let mut phrase = model.search();
    phrase.phrase("software engineer", "bio").unwrap();
    assert_eq!(phrase.raw_builder().operator_name(), Some("phrase"));

    let mut autocomplete = model.search();
    autocomplete.autocomplete("joh", "name").unwrap();
    assert_eq!(
        autocomplete.build().unwrap().get_document("autocomplete").unwrap(),
        &doc! { "query": "joh", "path": "name" }
    );

    let mut invalid = model.search();
    assert!(invalid.phrase("x", "category").is_err());
}

#[test]
fn test_facet_uses_default_buckets() {
    let model = user_search();
    let mut query = model.search();
    query.facet("category").unwrap();

    assert_eq!(
        query.build().unwrap().get_document("facets").unwrap(),
        &doc! { "category": { "type": "string", "path": "category", "numBuckets": 10_i64 } }
    );
}

#[test]
fn test_facet_rejects_search_only_field() {
    let model = user_search();
    let mut query = model.search();
    let err = query.facet("name").unwrap_err();
    assert!(matches!(
        err,
        DataBridgeError::UnsupportedOperation { ref operation, .. } if operation == "facet"
    ));
    assert_eq!(query.raw_builder().facet_count(), 0);
}

#[test]
fn test_facet_with_boundaries() {
    let model = user_search();
    let mut query = model.search();
    query
        .facet_with("age", FacetOptions::new().boundaries([0, 18, 65]).default_bucket("other"))
        .unwrap();

    assert_eq!(
        query.build().unwrap().get_document("facets").unwrap(),
        &doc! {
            "age": { "type": "number", "path": "age", "boundaries": [0, 18, 65], "default": "other" }
        }
    );
}

#[test]
fn test_facet_all_in_schema_order() {
    init_tracing();
    let model = user_search();
    let mut query = model.search();
    query.facet_all(FacetOptions::new().num_buckets(5)).unwrap();

    let search = query.build().unwrap();
    let facets = search.get_document("facets").unwrap();
    let names: Vec<&str> = facets.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["age", "category"]);
    assert_eq!(
        facets.get_document("category").unwrap(),
        &doc! { "type": "string", "path": "category", "numBuckets": 5_i64 }
    );
}

#[test]
fn test_compound_query_is_not_validated() {
    let model = user_search();
    let mut compound = CompoundBuilder::new();
    compound.must().text("john", "undeclared");

    let mut query = model.search();
    query.compound(compound);
    let search = query.build().unwrap();
    assert!(search.get_document("compound").unwrap().contains_key("must"));
}

#[test]
fn test_count_and_highlight() {
    let model = user_search();
    let mut query = model.search();
    query
        .text("john", "name")
        .unwrap()
        .count(CountType::Total, None)
        .highlight("bio", None)
        .unwrap();

    let search = query.build().unwrap();
    assert_eq!(search.get_document("count").unwrap(), &doc! { "type": "total" });
    assert_eq!(search.get_document("highlight").unwrap(), &doc! { "path": "bio" });

    assert!(query.highlight("category", None).is_err());
}

#[test]
fn test_facet_operator_mode() {
    let model = user_search();
    let mut compound = CompoundBuilder::new();
    compound.must().text("john", "name");

    let mut query = model.search();
    query.facet_operator(compound).facet("category").unwrap();

    let search = query.build().unwrap();
    let facet = search.get_document("facet").unwrap();
    assert!(facet.contains_key("operator"));
    assert!(facet.get_document("facets").unwrap().contains_key("category"));
}

#[test]
fn test_stage_projections() {
    let model = user_search();
    let mut query = model.search();
    query.text("john", "name").unwrap();

    let search = query.build().unwrap();
    assert_eq!(query.build_stage().unwrap(), doc! { "$search": search.clone() });
    assert_eq!(query.build_meta_stage().unwrap(), doc! { "$searchMeta": search });
}

#[test]
fn test_second_operator_fails_at_build() {
    let model = user_search();
    let mut query = model.search();
    query.text("john", "name").unwrap().autocomplete("jo", "name").unwrap();
    assert!(matches!(query.build(), Err(DataBridgeError::Query(_))));
}

#[test]
fn test_into_builder_drops_validation() {
    let model = user_search();
    let mut query = model.search();
    query.text("john", "name").unwrap();

    let builder = query.into_builder().highlight("undeclared", None);
    assert_eq!(builder.index(), "users");
    assert!(builder.build().unwrap().contains_key("highlight"));
}

// ============================================================================
// REAL-WORLD MODELS
// ============================================================================

#[test]
fn test_message_search_model() {
    let model = SearchModel::builder("MessageSearch")
        .index("messages")
        .fields([
            ("type", IndexField::new().with_string_facet().with_string_index()),
            ("rawData.from", IndexField::new().with_string_facet().with_string_index()),
            ("rawData.to", IndexField::new().with_string_index()),
            ("status", IndexField::new().with_string_index()),
            ("timestamp", IndexField::new().with_date_index().with_date_facet()),
        ])
        .build()
        .unwrap();

    let mut query = model.search();
    query.text("email", "type").unwrap().facet("type").unwrap();
    let search = query.build().unwrap();
    assert!(search.contains_key("text"));
    assert!(search.contains_key("facets"));

    let mut nested = model.search();
    nested.text("user@example.com", "rawData.from").unwrap();
    assert_eq!(
        nested.build().unwrap().get_document("text").unwrap(),
        &doc! { "query": "user@example.com", "path": "rawData.from" }
    );
}

#[test]
fn test_product_catalog_search() {
    let model = SearchModel::builder("ProductSearch")
        .index("products")
        .field("name", IndexField::new().with_string_index())
        .field("description", IndexField::new().with_string_index())
        .field("category", IndexField::new().with_string_facet().with_string_index())
        .fields([
            ("price.amount", IndexField::new().with_number_index().with_number_facet()),
            ("price.currency", IndexField::new().with_string_facet()),
            ("metadata.brand", IndexField::new().with_string_facet().with_string_index()),
            ("metadata.tags", IndexField::new().with_string_index()),
        ])
        .build()
        .unwrap();

    let mut compound = CompoundBuilder::new();
    compound.must().text("laptop", "name");
    compound.filter().text("electronics", "category");

    let mut query = model.search();
    query
        .compound(compound)
        .facet("category")
        .unwrap()
        .facet_with("price.amount", FacetOptions::new().boundaries([0, 500, 1000, 2000]))
        .unwrap()
        .facet("metadata.brand")
        .unwrap()
        .count(CountType::Total, None);

    let search = query.build().unwrap();
    assert!(search.contains_key("compound"));
    let facets = search.get_document("facets").unwrap();
    let names: Vec<&str> = facets.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["category", "price.amount", "metadata.brand"]);
}

#[test]
fn test_user_search_autocomplete_with_all_facets() {
    let model = SearchModel::builder("UserSearch")
        .index("users")
        .field("username", IndexField::new().with_string_index())
        .field("email", IndexField::new().with_string_index())
        .field("role", IndexField::new().with_string_facet())
        .field("department", IndexField::new().with_string_facet())
        .build()
        .unwrap();

    let mut query = model.search();
    query
        .autocomplete("joh", "username")
        .unwrap()
        .facet_all(FacetOptions::new())
        .unwrap();

    let search = query.build().unwrap();
    assert!(search.contains_key("autocomplete"));
    assert_eq!(search.get_document("facets").unwrap().len(), 2);
}

#[test]
fn test_shared_model_across_threads() {
    let model = std::sync::Arc::new(user_search());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let model = std::sync::Arc::clone(&model);
            std::thread::spawn(move || {
                let mut query = model.search();
                query.text(format!("user{}", i), "name").unwrap();
                query.build_stage().unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().contains_key("$search"));
    }
}
