use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::{path::PathBuf, sync::Arc};

use crate::{
    attachments, balance, imports, owners, patterns, refills, session, tags, transactions, user,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    /// Directory where attachment bytes are stored.
    pub attachments_dir: PathBuf,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/session", post(session::sign_in).delete(session::sign_out))
        .route("/import", post(imports::import))
        .route("/batches", get(imports::list))
        .route(
            "/batches/{id}",
            get(imports::get).delete(imports::delete),
        )
        .route("/owners", get(owners::list).post(owners::create))
        .route(
            "/owners/{id}",
            get(owners::get)
                .patch(owners::update)
                .delete(owners::delete),
        )
        .route(
            "/owners/{id}/patterns",
            get(patterns::list_for_owner).post(patterns::create_for_owner),
        )
        .route(
            "/ownerPatterns/{id}/toggle",
            post(patterns::toggle_owner_pattern),
        )
        .route("/ownerPatterns/{id}", delete(patterns::delete_owner_pattern))
        .route("/tags", get(tags::list).post(tags::create))
        .route("/tags/{id}", delete(tags::delete))
        .route("/tags/{id}/rename", post(tags::rename))
        .route("/tags/{id}/parent", post(tags::reparent))
        .route(
            "/tags/{id}/patterns",
            get(patterns::list_for_tag).post(patterns::create_for_tag),
        )
        .route(
            "/tagPatterns/{id}/toggle",
            post(patterns::toggle_tag_pattern),
        )
        .route("/tagPatterns/{id}", delete(patterns::delete_tag_pattern))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/get", post(transactions::get_detail))
        .route("/transactions/{id}", axum::routing::patch(transactions::update))
        .route("/transactions/{id}/tags", post(transactions::assign_tag))
        .route(
            "/transactions/{id}/tags/{tag_id}",
            delete(transactions::remove_tag),
        )
        .route("/refills", get(refills::list).post(refills::create))
        .route("/refills/{id}", get(refills::get).delete(refills::delete))
        .route(
            "/refills/{id}/pendingPayments",
            get(refills::pending_payments),
        )
        .route("/pendingPayments", get(refills::summary))
        .route(
            "/balance",
            get(balance::estimate).post(balance::set_checkpoint),
        )
        .route(
            "/attachments",
            get(attachments::list).post(attachments::upload),
        )
        .route(
            "/attachments/{id}",
            get(attachments::get).delete(attachments::delete),
        )
        .route("/attachments/{id}/download", get(attachments::download))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, attachments_dir: PathBuf) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, attachments_dir, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    attachments_dir: PathBuf,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
        attachments_dir,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    attachments_dir: PathBuf,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, attachments_dir, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, is_admin) VALUES (?, ?, ?)",
            vec!["alice".into(), "password".into(), true.into()],
        ))
        .await
        .unwrap();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, is_admin) VALUES (?, ?, ?)",
            vec!["bob".into(), "password".into(), false.into()],
        ))
        .await
        .unwrap();

        let engine = Engine::builder().database(db.clone()).build().await.unwrap();
        let state = ServerState {
            engine: Arc::new(engine),
            db,
            attachments_dir: std::env::temp_dir().join("porteria-test-attachments"),
        };
        router(state)
    }

    fn basic(username: &str) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:password"));
        format!("Basic {encoded}")
    }

    #[tokio::test]
    async fn requests_without_credentials_are_rejected() {
        let app = test_router().await;
        let res = app
            .oneshot(Request::get("/tags").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // Missing Authorization is rejected by the typed-header extractor.
        assert!(res.status().is_client_error());
    }

    #[tokio::test]
    async fn authenticated_user_can_list_tags() {
        let app = test_router().await;
        let res = app
            .oneshot(
                Request::get("/tags")
                    .header(header::AUTHORIZATION, basic("alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let tags: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn non_admin_mutation_is_forbidden_before_any_side_effect() {
        let app = test_router().await;
        let res = app
            .clone()
            .oneshot(
                Request::post("/tags")
                    .header(header::AUTHORIZATION, basic("bob"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"lpg","parent_id":null}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = app
            .oneshot(
                Request::get("/tags")
                    .header(header::AUTHORIZATION, basic("alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let tags: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_router().await;
        let encoded = base64::engine::general_purpose::STANDARD.encode("alice:wrong");
        let res = app
            .oneshot(
                Request::get("/tags")
                    .header(header::AUTHORIZATION, format!("Basic {encoded}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
