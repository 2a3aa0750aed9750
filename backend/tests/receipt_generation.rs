use chrono::NaiveDate;
use common::model::landlord::Landlord;
use common::model::template::{NewTemplate, TemplateType};
use common::model::tenant::{Gender, NewTenant, Tenant};
use common::requests::GenerateReceiptRequest;
use quittance_server::analyzer::AssetFamily;
use quittance_server::db;
use quittance_server::documents::DocumentRenderer;
use quittance_server::services::receipts::generate::generate_receipt;
use quittance_server::services::templates::save::create_template;
use quittance_server::services::templates::upload::{StoredUpload, TemplateForm};
use quittance_server::AppState;
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    state: AppState,
    tenant: Tenant,
}

fn owner() -> Landlord {
    Landlord {
        name: "Marie Martin".to_string(),
        address_line1: "8 rue des Lilas".to_string(),
        address_line2: Some("78000 Versailles".to_string()),
        signature_text: None,
        signature_image_path: None,
    }
}

fn fixture(landlord: Option<&Landlord>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = db::open_in_memory().unwrap();
    db::seed(&db, landlord).unwrap();
    let state = AppState::new(db, dir.path().join("receipts"), dir.path().join("uploads"));
    let tenant = state
        .records
        .insert_tenant(&NewTenant {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            gender: Gender::M,
            email: Some("jean.dupont@example.fr".to_string()),
            address: Some("12 rue de la Paix, Versailles 78000".to_string()),
            apartment_id: None,
        })
        .unwrap();
    Fixture {
        _dir: dir,
        state,
        tenant,
    }
}

fn request(tenant_id: i64, month: u32) -> GenerateReceiptRequest {
    GenerateReceiptRequest {
        tenant_id: Some(tenant_id),
        month: Some(month),
        year: Some(2024),
        amount: Some(500.0),
        charges: Some(50.0),
        payment_date: NaiveDate::from_ymd_opt(2024, month, 5),
        template_id: None,
    }
}

fn renderer() -> DocumentRenderer {
    DocumentRenderer::issued_on(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn generates_and_records_a_receipt() {
    let fx = fixture(Some(&owner()));
    let receipt = generate_receipt(&fx.state, &request(fx.tenant.id, 8), &renderer()).unwrap();

    assert_eq!(receipt.file_name, "2024_08_quittance_de_loyer_DUPONT_Jean.pdf");
    assert_eq!(receipt.amount, 500.0);
    assert_eq!(receipt.charges, 50.0);
    assert!(!receipt.email_sent);
    let default = fx.state.templates.find_default().unwrap();
    assert_eq!(receipt.template_id, Some(default.id));

    let bytes = std::fs::read(&receipt.file_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(
        Path::new(&receipt.file_path),
        fx.state
            .receipts_dir
            .join(fx.tenant.id.to_string())
            .join(&receipt.file_name)
    );
}

#[test]
fn tenants_sharing_a_name_keep_separate_receipts() {
    let fx = fixture(Some(&owner()));
    let namesake = fx
        .state
        .records
        .insert_tenant(&NewTenant {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            gender: Gender::M,
            email: None,
            address: Some("3 avenue de Paris, Versailles 78000".to_string()),
            apartment_id: None,
        })
        .unwrap();

    let first = generate_receipt(&fx.state, &request(fx.tenant.id, 8), &renderer()).unwrap();
    let mut cheaper = request(namesake.id, 8);
    cheaper.amount = Some(420.0);
    let second = generate_receipt(&fx.state, &cheaper, &renderer()).unwrap();

    assert_eq!(first.file_name, second.file_name);
    assert_ne!(first.file_path, second.file_path);
    let first_bytes = std::fs::read(&first.file_path).unwrap();
    let second_bytes = std::fs::read(&second.file_path).unwrap();
    assert!(first_bytes.starts_with(b"%PDF"));
    assert!(second_bytes.starts_with(b"%PDF"));
    assert_ne!(first_bytes, second_bytes);
}

#[test]
fn second_receipt_for_the_same_period_is_a_duplicate() {
    let fx = fixture(Some(&owner()));
    generate_receipt(&fx.state, &request(fx.tenant.id, 8), &renderer()).unwrap();

    let err = generate_receipt(&fx.state, &request(fx.tenant.id, 8), &renderer()).unwrap_err();
    assert_eq!(err.kind(), "duplicate_period");
    let tenant_dir = fx.state.receipts_dir.join(fx.tenant.id.to_string());
    assert_eq!(files_in(&tenant_dir), 1);

    let september = generate_receipt(&fx.state, &request(fx.tenant.id, 9), &renderer()).unwrap();
    assert_eq!(september.month, 9);
    assert_eq!(files_in(&tenant_dir), 2);

    let months: Vec<u32> = fx
        .state
        .records
        .receipts_for_tenant(fx.tenant.id)
        .unwrap()
        .iter()
        .map(|r| r.month)
        .collect();
    assert_eq!(months, vec![9, 8]);
}

#[test]
fn invalid_request_writes_nothing() {
    let fx = fixture(Some(&owner()));
    let mut invalid = request(fx.tenant.id, 8);
    invalid.amount = Some(0.0);
    let err = generate_receipt(&fx.state, &invalid, &renderer()).unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(files_in(&fx.state.receipts_dir), 0);
}

#[test]
fn unknown_tenant_template_or_owner_is_not_found() {
    let fx = fixture(Some(&owner()));
    let err = generate_receipt(&fx.state, &request(404, 8), &renderer()).unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let mut explicit = request(fx.tenant.id, 8);
    explicit.template_id = Some(404);
    let err = generate_receipt(&fx.state, &explicit, &renderer()).unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let without_owner = fixture(None);
    let err = generate_receipt(
        &without_owner.state,
        &request(without_owner.tenant.id, 8),
        &renderer(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert_eq!(files_in(&without_owner.state.receipts_dir), 0);
}

#[test]
fn explicit_template_with_image_background_is_used() {
    let fx = fixture(Some(&owner()));
    let background = fx.state.uploads_dir.join("fond.png");
    std::fs::create_dir_all(&fx.state.uploads_dir).unwrap();
    image::RgbImage::from_pixel(8, 8, image::Rgb([240, 240, 240]))
        .save(&background)
        .unwrap();

    let template = fx
        .state
        .templates
        .create(&NewTemplate::named("Papier à en-tête"))
        .unwrap();
    fx.state
        .templates
        .attach_background(template.id, &background.to_string_lossy())
        .unwrap();

    let mut explicit = request(fx.tenant.id, 8);
    explicit.template_id = Some(template.id);
    let receipt = generate_receipt(&fx.state, &explicit, &renderer()).unwrap();
    assert_eq!(receipt.template_id, Some(template.id));
    assert!(std::fs::read(&receipt.file_path).unwrap().starts_with(b"%PDF"));
}

fn upload(dir: &Path, name: &str, family: Option<AssetFamily>) -> StoredUpload {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"contenu").unwrap();
    StoredUpload {
        path,
        original_name: name.to_string(),
        family,
        fresh: true,
    }
}

#[test]
fn unsupported_template_file_falls_back_to_standard_layout() {
    let fx = fixture(Some(&owner()));
    let file = upload(&fx.state.uploads_dir, "notes.txt", None);
    let form = TemplateForm {
        template: Some(NewTemplate::named("Importé")),
        template_file: Some(file.clone()),
        background: None,
    };

    let template = create_template(&fx.state.templates, form).unwrap();
    assert_eq!(template.template_type, TemplateType::Uploaded);
    assert_eq!(template.source_file_path, Some(file.path_string()));
    assert!(template.configuration.metadata.is_none());
    assert_eq!(
        template.configuration.layout.background_asset,
        Some(file.path_string())
    );
    assert!(file.path.exists());
}

#[test]
fn uploaded_pdf_template_is_analyzed() {
    let fx = fixture(Some(&owner()));
    let file = upload(&fx.state.uploads_dir, "modele.pdf", Some(AssetFamily::Pdf));
    let form = TemplateForm {
        template: Some(NewTemplate::named("Modèle compact")),
        template_file: Some(file),
        background: None,
    };

    let template = create_template(&fx.state.templates, form).unwrap();
    let metadata = template.configuration.metadata.unwrap();
    assert_eq!(metadata.generated_from, "uploaded_template");
    assert_eq!(metadata.original_file, "modele.pdf");
}

#[test]
fn non_image_background_is_rejected_and_removed() {
    let fx = fixture(Some(&owner()));
    let background = upload(&fx.state.uploads_dir, "fond.pdf", Some(AssetFamily::Pdf));
    let form = TemplateForm {
        template: Some(NewTemplate::named("Fond PDF")),
        template_file: None,
        background: Some(background.clone()),
    };

    let err = create_template(&fx.state.templates, form).unwrap_err();
    assert_eq!(err.kind(), "unsupported_template_type");
    assert!(!background.path.exists());
    assert_eq!(fx.state.templates.find_all().unwrap().len(), 1);
}

#[test]
fn missing_template_part_is_a_validation_error() {
    let fx = fixture(Some(&owner()));
    let err = create_template(&fx.state.templates, TemplateForm::default()).unwrap_err();
    assert_eq!(err.kind(), "validation_error");
}
