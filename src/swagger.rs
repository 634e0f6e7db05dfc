use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::ticket::create_ticket,
        handlers::ticket::list_tickets,
        handlers::ticket::get_ticket,
        handlers::report::get_summary,
        handlers::catalog::list_zones,
        handlers::catalog::list_draw_types,
        handlers::catalog::list_schedules,
        handlers::catalog::list_limits,
    ),
    components(
        schemas(
            Ticket,
            TicketItem,
            TicketItemRequest,
            CreateTicketRequest,
            TicketQuery,
            Zone,
            DrawType,
            Schedule,
            NumberLimit,
            CatalogQuery,
            GroupBy,
            ReportQuery,
            SummaryReport,
            SummaryRow,
            ReportTotals,
            ReportPagination,
            DailyTotals,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "ticket", description = "Ticket admission API"),
        (name = "report", description = "Sales report API"),
        (name = "catalog", description = "Zones, draw types, cutoffs and number limits"),
    ),
    info(
        title = "Loteria Backend API",
        version = "1.0.0",
        description = "Ticket admission and sales reporting REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
