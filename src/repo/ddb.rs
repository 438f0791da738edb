use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::model::{AttributeValue, ReturnValue};
use aws_config::SdkConfig;
use chrono::{DateTime, Utc};
use log::{debug, error};
use std::fmt::Debug;
use std::str::FromStr;
use std::collections::HashMap;

use super::{StoreError, TicketScope, TicketStore};
use crate::model::ticket::{Comment, Ticket, TicketStatus};

type Item = HashMap<String, AttributeValue>;

// Items written before versioning carry no `version`; they read as 0.
const BUMP_VERSION: &str = "#version = if_not_exists(#version, :zero) + :one";
const EXPECT_VERSION: &str =
    "attribute_exists(ticket_id) AND ((attribute_not_exists(#version) AND :expected = :zero) OR #version = :expected)";

fn status_update_expression() -> String {
    format!("SET #status = :status, #updated_at = :now, {}", BUMP_VERSION)
}

fn append_comment_expression() -> String {
    format!(
        "SET #comments = list_append(if_not_exists(#comments, :empty), :comment), #updated_at = :now, {}",
        BUMP_VERSION
    )
}

fn remove_comment_expression(index: usize) -> String {
    format!("REMOVE #comments[{}] SET #updated_at = :now, {}", index, BUMP_VERSION)
}

pub struct DDBRepository {  //one item per ticket, keyed by ticket_id
    client: Client,
    table_name: String
}

fn backend_error<E: Debug>(operation: &str, err: E) -> StoreError {
    error!("dynamodb {} failed: {:?}", operation, err);
    StoreError::Backend(format!("{} failed", operation))
}

fn malformed(key: &str, problem: &str) -> StoreError {
    StoreError::Malformed(format!("attribute `{}` {}", key, problem))
}

fn required_item_value(key: &str, item: &Item) -> Result<String, StoreError> {
    match item_value(key, item)? {
        Some(value) => Ok(value),
        None => Err(malformed(key, "is missing"))
    }
}

fn item_value(key: &str, item: &Item) -> Result<Option<String>, StoreError> {
    match item.get(key) {
        Some(value) => match value.as_s() {
            Ok(val) => Ok(Some(val.clone())),
            Err(_) => Err(malformed(key, "is not a string"))
        },
        None => Ok(None)
    }
}

fn required_enum<T: FromStr>(key: &str, item: &Item) -> Result<T, StoreError> {
    let raw = required_item_value(key, item)?;
    T::from_str(&raw).map_err(|_| malformed(key, "holds an unknown value"))
}

fn required_timestamp(key: &str, item: &Item) -> Result<DateTime<Utc>, StoreError> {
    let raw = required_item_value(key, item)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| malformed(key, "is not an RFC 3339 timestamp"))
}

fn number_value(key: &str, item: &Item) -> Result<u64, StoreError> {
    match item.get(key) {
        Some(value) => value
            .as_n()
            .ok()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| malformed(key, "is not a number")),
        None => Ok(0)
    }
}

fn list_value<'a>(key: &str, item: &'a Item) -> Result<&'a [AttributeValue], StoreError> {
    match item.get(key) {
        Some(value) => value
            .as_l()
            .map(|list| list.as_slice())
            .map_err(|_| malformed(key, "is not a list")),
        None => Ok(&[])
    }
}

fn item_to_comment(value: &AttributeValue) -> Result<Comment, StoreError> {
    let item = value.as_m().map_err(|_| malformed("comments", "holds a non-map entry"))?;
    Ok(Comment {
        comment_id: required_item_value("comment_id", item)?,
        user_id: required_item_value("user_id", item)?,
        user_name: item_value("user_name", item)?.unwrap_or_default(),
        message: required_item_value("message", item)?,
        created_at: required_timestamp("created_at", item)?
    })
}

fn comment_to_item(comment: &Comment) -> AttributeValue {
    let mut item = Item::new();
    item.insert(String::from("comment_id"), AttributeValue::S(comment.comment_id.clone()));
    item.insert(String::from("user_id"), AttributeValue::S(comment.user_id.clone()));
    item.insert(String::from("user_name"), AttributeValue::S(comment.user_name.clone()));
    item.insert(String::from("message"), AttributeValue::S(comment.message.clone()));
    item.insert(String::from("created_at"), AttributeValue::S(comment.created_at.to_rfc3339()));
    AttributeValue::M(item)
}

fn item_to_ticket(item: &Item) -> Result<Ticket, StoreError> {
    let attachments = list_value("attachments", item)?
        .iter()
        .map(|value| value.as_s().map(|s| s.clone()).map_err(|_| malformed("attachments", "holds a non-string entry")))
        .collect::<Result<Vec<String>, StoreError>>()?;

    let comments = list_value("comments", item)?
        .iter()
        .map(item_to_comment)
        .collect::<Result<Vec<Comment>, StoreError>>()?;

    Ok(Ticket {
        ticket_id: required_item_value("ticket_id", item)?,
        subject: required_item_value("subject", item)?,
        description: required_item_value("description", item)?,
        priority: required_enum("priority", item)?,
        status: required_enum("status", item)?,
        user_id: required_item_value("user_id", item)?,
        user_name: item_value("user_name", item)?.unwrap_or_default(),
        attachments,
        comments,
        created_at: required_timestamp("created_at", item)?,
        updated_at: required_timestamp("updated_at", item)?,
        version: number_value("version", item)?
    })
}

fn ticket_to_item(ticket: &Ticket) -> Item {
    let mut item = Item::new();
    item.insert(String::from("ticket_id"), AttributeValue::S(ticket.ticket_id.clone()));
    item.insert(String::from("subject"), AttributeValue::S(ticket.subject.clone()));
    item.insert(String::from("description"), AttributeValue::S(ticket.description.clone()));
    item.insert(String::from("priority"), AttributeValue::S(ticket.priority.to_string()));
    item.insert(String::from("status"), AttributeValue::S(ticket.status.to_string()));
    item.insert(String::from("user_id"), AttributeValue::S(ticket.user_id.clone()));
    item.insert(String::from("user_name"), AttributeValue::S(ticket.user_name.clone()));
    item.insert(
        String::from("attachments"),
        AttributeValue::L(ticket.attachments.iter().map(|a| AttributeValue::S(a.clone())).collect())
    );
    item.insert(String::from("comments"), AttributeValue::L(ticket.comments.iter().map(comment_to_item).collect()));
    item.insert(String::from("created_at"), AttributeValue::S(ticket.created_at.to_rfc3339()));
    item.insert(String::from("updated_at"), AttributeValue::S(ticket.updated_at.to_rfc3339()));
    item.insert(String::from("version"), AttributeValue::N(ticket.version.to_string()));
    item
}

fn updated_ticket(attributes: Option<&Item>) -> Result<Ticket, StoreError> {
    match attributes {
        Some(item) => item_to_ticket(item),
        None => Err(StoreError::Malformed(String::from("update returned no attributes")))
    }
}

impl DDBRepository {
    pub fn init(table_name: String, config: &SdkConfig) -> DDBRepository {
        let client = Client::new(config);
        DDBRepository {
            table_name,
            client
        }
    }

    fn key(ticket_id: &str) -> AttributeValue {
        AttributeValue::S(String::from(ticket_id))
    }
}

#[async_trait]
impl TicketStore for DDBRepository {
    async fn create_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let request = self.client.put_item()
            .table_name(&self.table_name)
            .set_item(Some(ticket_to_item(ticket)))
            .condition_expression("attribute_not_exists(ticket_id)");

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Err(StoreError::Duplicate)
                } else {
                    Err(backend_error("put_item", err))
                }
            }
        }
    }

    async fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>, StoreError> {
        let res = self.client
            .get_item()
            .table_name(&self.table_name)
            .key("ticket_id", DDBRepository::key(ticket_id))
            .consistent_read(true)
            .send()
            .await;

        match res {
            Ok(output) => match output.item() {
                Some(item) => item_to_ticket(item).map(Some),
                None => Ok(None)
            },
            Err(err) => Err(backend_error("get_item", err))
        }
    }

    async fn list_tickets(&self, scope: &TicketScope) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self.client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take());

            if let TicketScope::Owner(user_id) = scope {
                request = request
                    .filter_expression("#user_id = :user_id")
                    .expression_attribute_names("#user_id", "user_id")
                    .expression_attribute_values(":user_id", AttributeValue::S(user_id.clone()));
            }

            let output = request.send().await.map_err(|err| backend_error("scan", err))?;
            for item in output.items().unwrap_or_default() {
                tickets.push(item_to_ticket(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break
            }
        }

        debug!("scanned {} tickets for {:?}", tickets.len(), scope);
        Ok(tickets)
    }

    async fn append_comment(&self, ticket_id: &str, comment: Comment) -> Result<Ticket, StoreError> {
        let res = self.client
            .update_item()
            .table_name(&self.table_name)
            .key("ticket_id", DDBRepository::key(ticket_id))
            .update_expression(append_comment_expression())
            .condition_expression("attribute_exists(ticket_id)")
            .expression_attribute_names("#comments", "comments")
            .expression_attribute_names("#updated_at", "updated_at")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":empty", AttributeValue::L(Vec::new()))
            .expression_attribute_values(":comment", AttributeValue::L(vec![comment_to_item(&comment)]))
            .expression_attribute_values(":now", AttributeValue::S(comment.created_at.to_rfc3339()))
            .expression_attribute_values(":zero", AttributeValue::N(String::from("0")))
            .expression_attribute_values(":one", AttributeValue::N(String::from("1")))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match res {
            Ok(output) => updated_ticket(output.attributes()),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Err(StoreError::NotFound)
                } else {
                    Err(backend_error("update_item", err))
                }
            }
        }
    }

    async fn remove_comment(&self, ticket_id: &str, comment_id: &str) -> Result<Ticket, StoreError> {
        let ticket = self.get_ticket(ticket_id).await?.ok_or(StoreError::NotFound)?;
        let index = ticket
            .comments
            .iter()
            .position(|comment| comment.comment_id == comment_id)
            .ok_or(StoreError::CommentNotFound)?;

        // The guard fails if another session shifted the list since the read.
        let res = self.client
            .update_item()
            .table_name(&self.table_name)
            .key("ticket_id", DDBRepository::key(ticket_id))
            .update_expression(remove_comment_expression(index))
            .condition_expression(format!("#comments[{}].#comment_id = :comment_id", index))
            .expression_attribute_names("#comments", "comments")
            .expression_attribute_names("#comment_id", "comment_id")
            .expression_attribute_names("#updated_at", "updated_at")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":comment_id", AttributeValue::S(String::from(comment_id)))
            .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
            .expression_attribute_values(":zero", AttributeValue::N(String::from("0")))
            .expression_attribute_values(":one", AttributeValue::N(String::from("1")))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match res {
            Ok(output) => updated_ticket(output.attributes()),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_conditional_check_failed_exception() {
                    Err(StoreError::Conflict)
                } else {
                    Err(backend_error("update_item", err))
                }
            }
        }
    }

    async fn set_status(
        &self,
        ticket_id: &str,
        status: TicketStatus,
        expected_version: Option<u64>
    ) -> Result<Ticket, StoreError> {
        let mut request = self.client
            .update_item()
            .table_name(&self.table_name)
            .key("ticket_id", DDBRepository::key(ticket_id))
            .update_expression(status_update_expression())
            .expression_attribute_names("#status", "status")
            .expression_attribute_names("#updated_at", "updated_at")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":status", AttributeValue::S(status.to_string()))
            .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
            .expression_attribute_values(":zero", AttributeValue::N(String::from("0")))
            .expression_attribute_values(":one", AttributeValue::N(String::from("1")))
            .return_values(ReturnValue::AllNew);

        request = match expected_version {
            Some(expected) => request
                .condition_expression(EXPECT_VERSION)
                .expression_attribute_values(":expected", AttributeValue::N(expected.to_string())),
            None => request.condition_expression("attribute_exists(ticket_id)")
        };

        match request.send().await {
            Ok(output) => updated_ticket(output.attributes()),
            Err(err) => {
                let err = err.into_service_error();
                if !err.is_conditional_check_failed_exception() {
                    return Err(backend_error("update_item", err));
                }
                match self.get_ticket(ticket_id).await? {
                    Some(_) => Err(StoreError::Conflict),
                    None => Err(StoreError::NotFound)
                }
            }
        }
    }
}
