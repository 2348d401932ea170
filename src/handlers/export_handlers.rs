use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::entitlements::Feature;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::export::{self, ExportArtifact, ExportColumn, ExportFormat, ExportRequest};
use crate::services::{EntitlementService, PlatformService};

#[derive(Debug, Deserialize)]
pub struct MessageExportQuery {
    pub format: Option<ExportFormat>,
}

fn attachment(artifact: ExportArtifact) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, artifact.content_type))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(artifact.filename)],
        })
        .body(artifact.body)
}

/// Renders caller-supplied rows as a downloadable file.
pub async fn export_rows(
    _user: AuthenticatedUser,
    body: web::Json<ExportRequest>,
) -> Result<HttpResponse, AppError> {
    let artifact = export::render(&body, Utc::now())?;
    Ok(attachment(artifact))
}

pub async fn export_messages(
    user: AuthenticatedUser,
    query: web::Query<MessageExportQuery>,
    entitlements: web::Data<Arc<EntitlementService>>,
    platform: web::Data<Arc<PlatformService>>,
) -> Result<HttpResponse, AppError> {
    entitlements.require_feature(&user.user_id, Feature::Analytics).await?;

    let messages = platform.messages_for_export(&user.user_id).await?;
    let rows = messages
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let request = ExportRequest {
        title: "Messages".to_string(),
        subtitle: Some(user.email.clone()),
        columns: vec![
            ExportColumn::new("Date", "createdAt"),
            ExportColumn::new("Platform", "platform"),
            ExportColumn::new("Direction", "direction"),
            ExportColumn::new("Sender", "sender"),
            ExportColumn::new("Message", "content"),
            ExportColumn::new("Category", "category"),
            ExportColumn::new("Sentiment", "sentiment"),
        ],
        rows,
        format: query.format.unwrap_or(ExportFormat::Csv),
    };

    Ok(attachment(export::render(&request, Utc::now())?))
}
