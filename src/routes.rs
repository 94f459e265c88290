use actix_web::web;

use crate::auth::{current_user, login, logout, signup, update_avatar};
use crate::chat::{list_chat, post_chat};
use crate::comment::{create_comment, delete_comment, list_by_task};
use crate::error::{json_config, query_config};
use crate::health::health;
use crate::member::{invite_member, remove_member, update_member_role};
use crate::oauth::{google_callback, google_start};
use crate::project::{create_project, delete_project, get_project, list_projects, update_project};
use crate::task::{add_comment, create_task, delete_task, get_task, list_by_project, update_task};

/// Mounts every endpoint. Shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(
            web::scope("/api")
                // AUTH
                .service(
                    web::scope("/auth")
                        .route("/signup", web::post().to(signup))
                        .route("/login", web::post().to(login))
                        .route("/me/avatar", web::put().to(update_avatar))
                        .route("/google", web::get().to(google_start))
                        .route("/google/callback", web::get().to(google_callback))
                        .route("/current-user", web::get().to(current_user))
                        .route("/logout", web::get().to(logout)),
                )
                // PROJECTS
                .service(
                    web::scope("/projects")
                        .route("", web::get().to(list_projects))
                        .route("", web::post().to(create_project))
                        .route("/{id}", web::get().to(get_project))
                        .route("/{id}", web::put().to(update_project))
                        .route("/{id}", web::delete().to(delete_project))
                        .route("/{id}/invite", web::post().to(invite_member))
                        .route("/{project_id}/members/{member_id}", web::delete().to(remove_member))
                        .route("/{project_id}/members/{member_id}", web::put().to(update_member_role))
                        .route("/{id}/chat", web::get().to(list_chat))
                        .route("/{id}/chat", web::post().to(post_chat)),
                )
                // TASKS
                .service(
                    web::scope("/tasks")
                        .route("/project/{project_id}", web::get().to(list_by_project))
                        .route("", web::post().to(create_task))
                        .route("/{id}", web::get().to(get_task))
                        .route("/{id}", web::put().to(update_task))
                        .route("/{id}", web::delete().to(delete_task))
                        .route("/{id}/comments", web::post().to(add_comment)),
                )
                // COMMENTS
                .service(
                    web::scope("/comments")
                        .route("/task/{task_id}", web::get().to(list_by_task))
                        .route("", web::post().to(create_comment))
                        .route("/{id}", web::delete().to(delete_comment)),
                ),
        )
        .route("/health", web::get().to(health));
}
