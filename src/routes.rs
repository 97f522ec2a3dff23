use crate::{
    api::{attendance, course, employee, enrollment, goal, notification, settings, student, task},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/student")
                    .service(
                        web::resource("")
                            .route(web::post().to(student::create_student))
                            .route(web::get().to(student::list_students)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(student::update_student))
                            .route(web::get().to(student::get_student))
                            .route(web::delete().to(student::delete_student)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in")
                            .route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out")
                            .route(web::put().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::get().to(attendance::export_attendance)),
                    )
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::attendance_list)),
                    )
                    // /attendance/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(attendance::approve_attendance)),
                    )
                    // /attendance/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(attendance::reject_attendance)),
                    ),
            )
            .service(
                web::scope("/goal")
                    .service(
                        web::resource("")
                            .route(web::post().to(goal::create_goal))
                            .route(web::get().to(goal::goal_list)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(goal::get_goal))
                            .route(web::put().to(goal::update_goal))
                            .route(web::delete().to(goal::delete_goal)),
                    ),
            )
            .service(
                web::scope("/task")
                    .service(
                        web::resource("")
                            .route(web::post().to(task::create_task))
                            .route(web::get().to(task::task_list)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(task::get_task))
                            .route(web::put().to(task::update_task))
                            .route(web::delete().to(task::delete_task)),
                    ),
            )
            .service(
                web::scope("/course")
                    .service(
                        web::resource("")
                            .route(web::post().to(course::create_course))
                            .route(web::get().to(course::list_courses)),
                    ),
            )
            .service(
                web::scope("/enrollment")
                    .service(
                        web::resource("/repair-duplicates")
                            .route(web::post().to(enrollment::repair_duplicate_enrollments)),
                    )
                    .service(
                        web::resource("")
                            .route(web::post().to(enrollment::enroll))
                            .route(web::get().to(enrollment::enrollment_list)),
                    )
                    .service(
                        web::resource("/{id}/complete")
                            .route(web::put().to(enrollment::complete_enrollment)),
                    )
                    .service(
                        web::resource("/{id}/drop")
                            .route(web::put().to(enrollment::drop_enrollment)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(
                        web::resource("/work")
                            .route(web::get().to(settings::get_work_settings))
                            .route(web::put().to(settings::update_work_settings)),
                    ),
            )
            .service(
                web::scope("/notification")
                    .service(
                        web::resource("")
                            .route(web::get().to(notification::notification_list)),
                    )
                    .service(
                        web::resource("/{id}/read")
                            .route(web::put().to(notification::mark_read)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
