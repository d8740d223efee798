mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use common::{json_body, TestApp};
use reseller_api::entities::{customer, product};

#[tokio::test]
async fn customer_import_inserts_and_deduplicates() {
    let app = TestApp::new().await;

    // Existing customer whose phone appears again in the file.
    app.seed_customer("Ana Costa", "913333333").await;

    let csv = "Nome;Telefone;Email;Morada;Notas\n\
               Maria Silva;912345678;maria@example.com;Rua das Flores 1;VIP\n\
               ;911111111;;;\n\
               Nova Cliente;913333333;;;\n\
               Maria Silva;914444444;;;\n";

    let response = app
        .request_authenticated_text(Method::POST, "/api/v1/import/customers", csv)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = json_body(response).await;
    assert_eq!(report["inserted_count"], 1);
    // Duplicate phone and duplicate name within the file; the row missing
    // a name is dropped without counting.
    assert_eq!(report["skipped_count"], 2);
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);

    let imported = customer::Entity::find()
        .filter(customer::Column::Name.eq("Maria Silva"))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(imported.email.as_deref(), Some("maria@example.com"));
    assert_eq!(imported.address.as_deref(), Some("Rua das Flores 1"));
}

#[tokio::test]
async fn product_import_upserts_by_code_and_cleans_prices() {
    let app = TestApp::new().await;

    // Pre-existing product: the import updates it but leaves stock alone.
    let existing_id = app.seed_product("PRF-001", "4.50", "12.00", 7).await;

    let csv = "Código;Nome;Categoria;Gama;Tamanho;Marca;Preço Custo;Preço Cliente\n\
               PRF-001;Perfume Alpha;Perfumes;Premium;100ml;Acme;€ 5,00;€ 13,50\n\
               PRF-002;Perfume Beta;;;;;3,00;9,50\n\
               ;Sem Código;;;;;1,00;2,00\n";

    let response = app
        .request_authenticated_text(Method::POST, "/api/v1/import/products", csv)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = json_body(response).await;
    assert_eq!(report["inserted_count"], 1);
    assert_eq!(report["updated_count"], 1);
    // The row without a code is dropped silently.
    assert_eq!(report["skipped_count"], 0);

    let updated = product::Entity::find_by_id(existing_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Perfume Alpha");
    assert_eq!(updated.category, "Perfumes");
    assert_eq!(updated.range, "Premium");
    assert_eq!(updated.size.as_deref(), Some("100ml"));
    assert_eq!(updated.notes.as_deref(), Some("Marca: Acme"));
    assert_eq!(updated.cost_price, dec!(5.00));
    assert_eq!(updated.sell_price, dec!(13.50));
    assert_eq!(updated.stock_quantity, 7);

    let inserted = product::Entity::find()
        .filter(product::Column::Code.eq("PRF-002"))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inserted.category, "Geral");
    assert_eq!(inserted.range, "Standard");
    assert_eq!(inserted.cost_price, dec!(3.00));
    assert_eq!(inserted.stock_quantity, 0);

    // Re-importing with a blank primary price column falls through to the
    // alternate alias, and a file without a Marca column clears the notes.
    let csv = "Código;Nome;Preço Custo;Custo;Venda\n\
               PRF-001;Perfume Alpha;;5,25;14,00\n";

    let response = app
        .request_authenticated_text(Method::POST, "/api/v1/import/products", csv)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = product::Entity::find_by_id(existing_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.cost_price, dec!(5.25));
    assert_eq!(updated.sell_price, dec!(14.00));
    assert_eq!(updated.notes, None);
    assert_eq!(updated.stock_quantity, 7);
}

#[tokio::test]
async fn empty_file_is_a_client_error() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated_text(Method::POST, "/api/v1/import/customers", "")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn imports_are_scoped_to_the_importing_user() {
    let app = TestApp::new().await;

    let (_other_id, other_token) = app.register_user("other@example.com").await;
    let csv = "Nome;Telefone\nMaria Silva;912345678\n";

    let response = app
        .request_authenticated_text(Method::POST, "/api/v1/import/customers", csv)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The other user sees none of the imported rows.
    let response = app
        .request(Method::GET, "/api/v1/customers", None, Some(&other_token))
        .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 0);
}
