use crate::desk::TicketDesk;
use crate::error::TicketError;
use crate::model::ticket::{Ticket, TicketDraft, TicketPriority, TicketStatus};
use crate::repo::TicketScope;
use crate::view::{ListQuery, TicketPage};

use actix_web::{
    get,
    post,
    patch,
    delete,
    web::Path,
    web::Json,
    web::Data,
    web::Query,
    HttpResponse
};
use serde::{Serialize, Deserialize};


#[derive(Deserialize, Serialize)]
pub struct TicketIdentifier {
    ticket_id: String,
}

#[derive(Deserialize)]
pub struct CommentIdentifier {
    ticket_id: String,
    comment_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    description: String,
    priority: Option<TicketPriority>,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    attachments: Vec<String>
}

/// One body shape for both thread commands: `comment` adds a reply,
/// `status` changes the status.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTicketRequest {
    comment: Option<String>,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    user_name: String,
    status: Option<TicketStatus>,
    expected_version: Option<u64>,
    // Accepted for older dashboard builds; the recipient is derived here.
    #[allow(dead_code)]
    recipient_user_id: Option<String>
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListParams {
    user_id: Option<String>,
    search: Option<String>,
    page: Option<usize>
}

impl TicketListParams {
    fn list_query(&self) -> ListQuery {
        ListQuery {
            search: self.search.clone(),
            page: self.page
        }
    }
}

#[derive(Serialize)]
pub struct TicketResponse {
    success: bool,
    ticket: Ticket
}

impl TicketResponse {
    fn ok(ticket: Ticket) -> TicketResponse {
        TicketResponse { success: true, ticket }
    }
}

#[derive(Serialize)]
pub struct TicketListResponse {
    success: bool,
    #[serde(flatten)]
    page: TicketPage
}


#[post("/api/tickets/create")]
pub async fn create_ticket(
    desk: Data<TicketDesk>,
    request: Json<CreateTicketRequest>
) -> Result<HttpResponse, TicketError> {
    let request = request.into_inner();
    let ticket = desk.submit_ticket(TicketDraft {
        subject: request.subject,
        description: request.description,
        priority: request.priority.unwrap_or_default(),
        user_id: request.user_id,
        user_name: request.user_name,
        attachments: request.attachments
    }).await?;

    Ok(HttpResponse::Created().json(TicketResponse::ok(ticket)))
}

#[get("/api/tickets/create")]
pub async fn list_all_tickets(
    desk: Data<TicketDesk>,
    params: Query<TicketListParams>
) -> Result<Json<TicketListResponse>, TicketError> {
    let page = desk.list_tickets(TicketScope::All, &params.list_query()).await?;
    Ok(Json(TicketListResponse { success: true, page }))
}

#[get("/api/tickets")]
pub async fn list_user_tickets(
    desk: Data<TicketDesk>,
    params: Query<TicketListParams>
) -> Result<Json<TicketListResponse>, TicketError> {
    let user_id = match params.user_id.as_deref().map(str::trim) {
        Some(user_id) if !user_id.is_empty() => user_id.to_string(),
        _ => return Err(TicketError::Validation(String::from("userId query parameter is required")))
    };

    let page = desk.list_tickets(TicketScope::Owner(user_id), &params.list_query()).await?;
    Ok(Json(TicketListResponse { success: true, page }))
}

#[get("/api/tickets/{ticket_id}")]
pub async fn get_ticket(
    desk: Data<TicketDesk>,
    ticket_identifier: Path<TicketIdentifier>
) -> Result<Json<TicketResponse>, TicketError> {
    let ticket = desk.get_ticket(&ticket_identifier.ticket_id).await?;
    Ok(Json(TicketResponse::ok(ticket)))
}

#[patch("/api/tickets/{ticket_id}")]
pub async fn patch_ticket(
    desk: Data<TicketDesk>,
    ticket_identifier: Path<TicketIdentifier>,
    request: Json<PatchTicketRequest>
) -> Result<Json<TicketResponse>, TicketError> {
    let ticket_id = ticket_identifier.into_inner().ticket_id;
    let request = request.into_inner();

    let ticket = match (request.comment, request.status) {
        (Some(_), Some(_)) => {
            return Err(TicketError::Validation(String::from("send either comment or status, not both")))
        }
        (Some(comment), None) => {
            desk.add_comment(&ticket_id, &comment, &request.user_id, &request.user_name).await?
        }
        (None, Some(status)) => {
            desk.update_status(&ticket_id, status, request.expected_version).await?
        }
        (None, None) => {
            return Err(TicketError::Validation(String::from("either comment or status is required")))
        }
    };

    Ok(Json(TicketResponse::ok(ticket)))
}

#[delete("/api/tickets/{ticket_id}/comments/{comment_id}")]
pub async fn delete_comment(
    desk: Data<TicketDesk>,
    comment_identifier: Path<CommentIdentifier>
) -> Result<Json<TicketResponse>, TicketError> {
    let ticket = desk.delete_comment(
        &comment_identifier.ticket_id,
        &comment_identifier.comment_id
    ).await?;

    Ok(Json(TicketResponse::ok(ticket)))
}
