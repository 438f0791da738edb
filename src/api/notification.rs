use crate::desk::TicketDesk;
use crate::error::TicketError;
use crate::model::notification::{Notification, NotificationKind};
use crate::notify::Inbox;

use actix_web::{
    get,
    post,
    web::Json,
    web::Data,
    web::Query,
    HttpResponse
};
use serde::{Serialize, Deserialize};
use serde_json::json;


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(default)]
    recipient_user_id: String,
    #[serde(rename = "type", default)]
    kind: NotificationKind,
    #[serde(default)]
    message: String,
    ticket_id: Option<String>
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxParams {
    recipient_user_id: String
}

#[derive(Serialize)]
pub struct InboxResponse {
    success: bool,
    notifications: Vec<Notification>
}


#[post("/api/send-notification")]
pub async fn send_notification(
    desk: Data<TicketDesk>,
    request: Json<SendNotificationRequest>
) -> Result<HttpResponse, TicketError> {
    let request = request.into_inner();
    if request.recipient_user_id.trim().is_empty() {
        return Err(TicketError::Validation(String::from("recipientUserId is required")));
    }
    if request.message.trim().is_empty() {
        return Err(TicketError::Validation(String::from("message is required")));
    }

    desk.dispatch(Notification::new(
        request.recipient_user_id,
        request.kind,
        request.message,
        request.ticket_id
    ));
    Ok(HttpResponse::Accepted().json(json!({ "success": true })))
}

#[get("/api/notifications")]
pub async fn list_notifications(
    inbox: Data<Inbox>,
    params: Query<InboxParams>
) -> Json<InboxResponse> {
    Json(InboxResponse {
        success: true,
        notifications: inbox.for_recipient(&params.recipient_user_id)
    })
}
