use crate::config::Config;
use crate::db;
use crate::db::subscriptions;
use crate::deliver::TelegramDispatcher;
use crate::sync::check_job::FeedCheckJob;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use std::thread;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: &'static str,
    service_name: &'static str,
    webhook_url: String,
    version: &'static str,
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(StatusResponse {
        status: "running",
        service_name: "feedrelay",
        webhook_url: Config::external_url("/hubbub"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Manual trigger: kicks off a full sweep and acknowledges immediately.
async fn check_feeds() -> HttpResponse {
    log::info!("Received a manual feed check request");

    thread::spawn(|| FeedCheckJob::new(&TelegramDispatcher).run_all(false));

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Feed check started"
    }))
}

#[derive(Deserialize)]
struct PushQuery {
    feed: Option<String>,
}

/// WebSub content notification: re-checks every subscription tracking the
/// named feed URL.
async fn hubbub_push(query: web::Query<PushQuery>) -> HttpResponse {
    let Some(feed_url) = query.into_inner().feed else {
        return HttpResponse::BadRequest().body("Feed URL required");
    };

    let result = web::block(move || check_feed_url(&feed_url)).await;

    match result {
        Ok(Ok(true)) => HttpResponse::Ok().body("OK"),
        Ok(Ok(false)) => HttpResponse::NotFound().body("Feed not found"),
        Ok(Err(error)) => {
            log::error!("Failed to process a push notification: {error}");

            HttpResponse::InternalServerError().body("Error processing webhook")
        }
        Err(error) => {
            log::error!("Push notification worker failed: {error}");

            HttpResponse::InternalServerError().body("Error processing webhook")
        }
    }
}

fn check_feed_url(feed_url: &str) -> Result<bool, String> {
    let mut connection = db::pool().get().map_err(|error| error.to_string())?;

    let matching =
        subscriptions::find_by_url(&mut connection, feed_url).map_err(|error| error.to_string())?;

    if matching.is_empty() {
        return Ok(false);
    }

    let job = FeedCheckJob::new(&TelegramDispatcher);

    for subscription in &matching {
        if let Err(error) = job.run_one(subscription, false) {
            log::error!(
                "Push-triggered check failed for \"{}\": {}",
                subscription.title,
                error
            );
        }
    }

    Ok(true)
}

#[derive(Deserialize)]
struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.topic")]
    topic: Option<String>,
}

/// WebSub subscription handshake: echo the challenge back for recognized
/// modes, reject anything else.
async fn hubbub_verify(query: web::Query<VerifyQuery>) -> HttpResponse {
    let query = query.into_inner();

    match (query.mode.as_deref(), query.challenge) {
        (Some(mode @ ("subscribe" | "unsubscribe")), Some(challenge)) => {
            log::info!("WebSub {} request for {:?}", mode, query.topic);

            HttpResponse::Ok().body(challenge)
        }
        _ => HttpResponse::BadRequest().body("Bad Request"),
    }
}

pub async fn start() -> std::io::Result<()> {
    let port = Config::port();

    log::info!("Starting the HTTP server on port {port}");

    HttpServer::new(|| {
        App::new()
            .wrap(middleware::Logger::default())
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/check-feeds").route(web::get().to(check_feeds)))
            .service(
                web::resource("/hubbub")
                    .route(web::get().to(hubbub_verify))
                    .route(web::post().to(hubbub_push)),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::hubbub_verify;
    use actix_web::{test, web, App};

    async fn verify_response(query: &str) -> (u16, String) {
        let app =
            test::init_service(App::new().service(
                web::resource("/hubbub").route(web::get().to(hubbub_verify)),
            ))
            .await;

        let request = test::TestRequest::get()
            .uri(&format!("/hubbub{query}"))
            .to_request();
        let response = test::call_service(&app, request).await;

        let status = response.status().as_u16();
        let body = test::read_body(response).await;

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn the_handshake_echoes_the_challenge_for_subscribe_mode() {
        let (status, body) =
            verify_response("?hub.mode=subscribe&hub.challenge=abc123&hub.topic=http://a/feed")
                .await;

        assert_eq!(200, status);
        assert_eq!("abc123", body);
    }

    #[actix_web::test]
    async fn the_handshake_accepts_unsubscribe_mode() {
        let (status, body) =
            verify_response("?hub.mode=unsubscribe&hub.challenge=xyz").await;

        assert_eq!(200, status);
        assert_eq!("xyz", body);
    }

    #[actix_web::test]
    async fn the_handshake_rejects_unknown_modes_and_missing_challenges() {
        let (status, _) = verify_response("?hub.mode=dance&hub.challenge=abc").await;
        assert_eq!(400, status);

        let (status, _) = verify_response("?hub.mode=subscribe").await;
        assert_eq!(400, status);

        let (status, _) = verify_response("").await;
        assert_eq!(400, status);
    }
}
