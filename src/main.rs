use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use backend::{
    AppState,
    config::Config,
    middleware::{RateLimiter, auth_middleware, log_errors, rate_limit},
    routes,
    services::Services,
    store::{
        GroupStore, JoinRequestStore, MembershipStore, PgGroupStore, PgJoinRequestStore,
        PgMembershipStore, PgUserStore, UserStore,
    },
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'rideout_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    let pool = Arc::new(pool);

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let redis_arc = Arc::new(redis_client.clone());

    // 组装存储与服务
    let groups: Arc<dyn GroupStore> =
        Arc::new(PgGroupStore::new(pool.clone(), redis_arc.clone()));
    let members: Arc<dyn MembershipStore> = Arc::new(PgMembershipStore::new(pool.clone()));
    let requests: Arc<dyn JoinRequestStore> = Arc::new(PgJoinRequestStore::new(pool.clone()));
    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));

    let state = AppState {
        config: config.clone(),
        services: Arc::new(Services::new(groups, members, requests, users)),
    };

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, config.clone()));

    // 全部群组路由都需要认证
    let protected_routes = Router::new()
        // 群组路由
        .route("/groups/create", post(routes::group::create_group))
        .route("/groups/detail", get(routes::group::get_group_detail))
        .route("/groups/update", put(routes::group::update_group))
        .route("/groups/delete", post(routes::group::delete_group))
        .route("/groups/suggested", get(routes::group::get_suggested_groups))
        // 成员路由
        .route("/groups/members", get(routes::member::get_group_members))
        .route("/groups/join", post(routes::member::join_group))
        .route("/groups/leave", post(routes::member::leave_group))
        .route("/groups/remove-member", post(routes::member::remove_member))
        .route("/groups/promote-admin", post(routes::member::promote_member))
        .route("/groups/demote-admin", post(routes::member::demote_member))
        .route(
            "/groups/transfer-ownership",
            post(routes::member::transfer_ownership),
        )
        // 入群申请路由
        .route(
            "/groups/requests/create",
            post(routes::join_request::create_join_request),
        )
        .route(
            "/groups/requests/cancel",
            post(routes::join_request::cancel_join_request),
        )
        .route(
            "/groups/requests/approve",
            post(routes::join_request::approve_join_request),
        )
        .route(
            "/groups/requests/reject",
            post(routes::join_request::reject_join_request),
        )
        .route(
            "/groups/requests/pending",
            get(routes::join_request::get_pending_requests),
        )
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 创建基础路由
    let router = Router::new().nest(&config.api_base_uri.clone(), protected_routes);

    // 添加日志中间件和限流中间件
    let router = router.layer(axum::middleware::from_fn(log_errors)).layer(
        axum::middleware::from_fn_with_state(rate_limiter, rate_limit),
    );

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        // 设置开发环境的CORS，允许所有来源
        let cors = CorsLayer::permissive();
        router.layer(cors)
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
