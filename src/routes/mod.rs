use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;
use courses::{
    create_course, enroll_in_course, get_course, get_course_enrollments, get_my_courses,
};
use support_calls::{
    create_call, create_support_request, end_call, get_call_permission, get_course_calls,
    get_join_token, list_call_requests, transition_support_request,
};
use users::{get_profile, login, register};

mod courses;
mod health_check;
mod support_calls;
mod users;

use crate::routes::health_check::*;

fn util_routes() -> Scope {
    scope("").service(health_check)
}

fn users_routes() -> Scope {
    scope("users")
        .service(register)
        .service(login)
        .service(get_profile)
}

fn courses_routes() -> Scope {
    // `get_my_courses` goes first so `/mine` is not swallowed by `/{course_id}`
    scope("courses")
        .service(get_my_courses)
        .service(create_course)
        .service(enroll_in_course)
        .service(get_course_enrollments)
        .service(get_course)
}

fn calls_routes() -> Scope {
    scope("calls")
        .service(get_call_permission)
        .service(create_support_request)
        .service(transition_support_request)
        .service(get_course_calls)
        .service(create_call)
        .service(end_call)
        .service(get_join_token)
        .service(list_call_requests)
}

pub fn learnhub_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(users_routes())
            .service(courses_routes())
            .service(calls_routes())
            .service(util_routes()),
    );
}
