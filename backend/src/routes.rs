use crate::config::AppConfig;
use crate::inference::analyze;
use crate::inference::error::{AnalysisError, DecodeError};
use crate::inference::loader::ModelLoader;
use crate::inference::preprocess::{UploadedImage, detect_format};
use actix_files::Files;
use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;
use log::{error, info, warn};
use lungscan_ui::{AnalysisOutcome, PageProps, UploadView};
use std::path::PathBuf;
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().to(handle_upload)),
    )
    .service(web::resource("/health").route(web::get().to(health)))
    .service(Files::new("/static", static_dir));
}

/// Fields of the upload form.
struct UploadForm {
    image: Option<UploadedImage>,
    show_confidence: bool,
}

async fn index(config: web::Data<AppConfig>) -> HttpResponse {
    render(PageProps {
        show_confidence: config.ui.show_confidence_default,
        upload: None,
    })
    .await
}

async fn health(loader: web::Data<ModelLoader>) -> HttpResponse {
    log::debug!("Health check (model loaded: {})", loader.is_loaded());
    HttpResponse::Ok().content_type(ContentType::plaintext()).body("ok")
}

async fn handle_upload(
    loader: web::Data<ModelLoader>,
    config: web::Data<AppConfig>,
    payload: Multipart,
) -> HttpResponse {
    let form = match read_upload_form(payload, config.inference.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Rejected malformed upload form: {}", e);
            let e = AnalysisError::from(DecodeError::Form(e.to_string()));
            return render(PageProps {
                show_confidence: config.ui.show_confidence_default,
                upload: Some(UploadView {
                    file_name: String::new(),
                    preview_src: None,
                    outcome: AnalysisOutcome::Failure {
                        message: e.user_message(),
                        hint: e.hint().map(String::from),
                    },
                }),
            })
            .await;
        }
    };

    let Some(upload) = form.image else {
        return render(PageProps {
            show_confidence: form.show_confidence,
            upload: None,
        })
        .await;
    };

    let request_id = Uuid::new_v4();
    info!(
        "[{}] Analyzing {} ({} bytes)",
        request_id, upload.file_name, upload.received_size
    );

    let preview_src = if upload.received_size <= config.inference.max_upload_bytes {
        detect_format(&upload.bytes)
            .ok()
            .map(|format| upload.data_uri(format))
    } else {
        None
    };
    let file_name = upload.file_name.clone();

    let outcome = match analyze(&loader, &config, upload).await {
        Ok(prediction) => {
            info!(
                "[{}] Predicted {} ({})",
                request_id,
                prediction.predicted_class,
                prediction.confidence_display()
            );
            AnalysisOutcome::Success(prediction)
        }
        Err(e) => {
            if e.is_user_actionable() {
                warn!("[{}] Rejected upload: {}", request_id, e);
            } else {
                error!("[{}] Analysis failed: {:?}", request_id, e);
            }
            AnalysisOutcome::Failure {
                message: e.user_message(),
                hint: e.hint().map(String::from),
            }
        }
    };

    render(PageProps {
        show_confidence: form.show_confidence,
        upload: Some(UploadView {
            file_name,
            preview_src,
            outcome,
        }),
    })
    .await
}

async fn render(props: PageProps) -> HttpResponse {
    let page = lungscan_ui::render_page(props).await;
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page)
}

/// Reads the `image` file and `show_confidence` checkbox.
/// An unchecked checkbox is simply absent from the form.
async fn read_upload_form(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm {
        image: None,
        show_confidence: false,
    };

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "image" => form.image = read_image_field(&mut field, max_bytes).await?,
            "show_confidence" => {
                let value = read_text_field(&mut field).await?;
                form.show_confidence = !matches!(value.trim(), "false" | "off" | "0");
            }
            _ => while field.try_next().await?.is_some() {},
        }
    }

    Ok(form)
}

/// Collects at most `max_bytes`, but keeps counting so oversized uploads can be reported.
async fn read_image_field(
    field: &mut Field,
    max_bytes: usize,
) -> Result<Option<UploadedImage>, MultipartError> {
    let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or_default()
        .to_owned();
    let content_type = field.content_type().map(|mime| mime.essence_str().to_owned());

    let mut bytes = Vec::new();
    let mut received_size = 0;
    while let Some(chunk) = field.try_next().await? {
        received_size += chunk.len();
        if received_size <= max_bytes {
            bytes.extend_from_slice(&chunk);
        }
    }

    if file_name.is_empty() && received_size == 0 {
        return Ok(None);
    }

    let mut upload = UploadedImage::new(file_name, content_type, bytes);
    upload.received_size = received_size;
    Ok(Some(upload))
}

async fn read_text_field(field: &mut Field) -> Result<String, MultipartError> {
    let mut value = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        value.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&value).into_owned())
}
