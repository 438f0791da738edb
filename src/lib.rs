//! Support desk ticket service: ticket submission, listing, comment threads
//! and status changes, with notifications to the other party.

pub mod api;
pub mod config;
pub mod desk;
pub mod error;
pub mod model;
pub mod notify;
pub mod repo;
pub mod view;

use std::sync::Arc;

use log::info;

use config::{Settings, StoreBackend};
use desk::TicketDesk;
use notify::{Dispatcher, Inbox, WebhookNotifier};
use repo::ddb::DDBRepository;
use repo::memory::MemoryRepository;
use repo::TicketStore;

pub async fn build_store(settings: &Settings) -> Arc<dyn TicketStore> {
    match settings.store_backend {
        StoreBackend::Memory => {
            info!("using in-memory ticket store");
            Arc::new(MemoryRepository::new())
        }
        StoreBackend::DynamoDb => {
            info!("using dynamodb table {}", settings.ticket_table);
            let config = aws_config::load_from_env().await;
            Arc::new(DDBRepository::init(settings.ticket_table.clone(), &config))
        }
    }
}

pub fn build_dispatcher(settings: &Settings, inbox: Arc<Inbox>) -> Dispatcher {
    let dispatcher = Dispatcher::new(inbox);
    match &settings.notification_webhook_url {
        Some(url) => {
            let webhook = WebhookNotifier::new(url);
            info!("forwarding notifications to {}", webhook.url());
            dispatcher.with_forwarder(webhook)
        }
        None => dispatcher
    }
}

pub fn build_desk(settings: &Settings, store: Arc<dyn TicketStore>, dispatcher: Dispatcher) -> TicketDesk {
    TicketDesk::new(store, Arc::new(dispatcher), settings.admin_user_ids.clone())
}
