use std::sync::Arc;

use actix_web::{HttpServer, App, web::Data, middleware::Logger};
use log::info;

use support_desk::config::Settings;
use support_desk::notify::Inbox;
use support_desk::{api, build_desk, build_dispatcher, build_store};


#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;

    let store = build_store(&settings).await;
    let dispatcher = build_dispatcher(&settings, Arc::new(Inbox::with_capacity(settings.inbox_capacity)));
    let inbox = Data::from(dispatcher.inbox().clone());
    let desk = Data::new(build_desk(&settings, store, dispatcher));

    info!("support desk listening on {}:{}", settings.bind_address, settings.port);
    HttpServer::new(move || {
        let logger = Logger::default();
        App::new()
            .wrap(logger)
            .app_data(desk.clone())
            .app_data(inbox.clone())
            .configure(api::configure)
    })
        .bind((settings.bind_address.as_str(), settings.port))?
        .run()
        .await
}
