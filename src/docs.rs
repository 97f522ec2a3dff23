use crate::api::attendance::{
    AttendanceFilter, AttendanceListResponse, CheckInReq, ExportQuery,
};
use crate::api::course::{CourseListResponse, CourseQuery, CreateCourse};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::enrollment::{EnrollReq, EnrollmentFilter, EnrollmentListResponse};
use crate::api::goal::{CreateGoal, GoalFilter, GoalListResponse, GoalWithTasks, UpdateGoal};
use crate::api::notification::{NotificationListResponse, NotificationQuery};
use crate::api::settings::UpdateWorkSettings;
use crate::api::student::{CreateStudent, StudentListResponse, StudentQuery};
use crate::api::task::{CreateTask, TaskFilter, TaskListResponse, UpdateTask};
use crate::model::attendance::Attendance;
use crate::model::course::Course;
use crate::model::employee::Employee;
use crate::model::enrollment::CourseEnrollment;
use crate::model::goal::Goal;
use crate::model::notification::Notification;
use crate::model::student::Student;
use crate::model::task::Task;
use crate::model::work_settings::WorkSettings;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CRM System API",
        version = "1.0.0",
        description = r#"
## Internal CRM System

This API powers an internal **CRM** with Admin, Employee and Student portals.

### Key Features
- **Employee & Student Management**
  - Create, update, list, and view profiles
- **Attendance Management**
  - Daily check-in/check-out, admin approval with lateness flags, CSV export
- **Goals & Tasks**
  - Employee goals with progress rolled up from their tasks
- **Courses & Enrollments**
  - One ongoing course per student, enforced at the database
- **Notifications**
  - Queued off the request path

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Only authorized roles can access sensitive operations.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::approve_attendance,
        crate::api::attendance::reject_attendance,
        crate::api::attendance::attendance_list,
        crate::api::attendance::export_attendance,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::student::create_student,
        crate::api::student::get_student,
        crate::api::student::list_students,
        crate::api::student::update_student,
        crate::api::student::delete_student,

        crate::api::goal::create_goal,
        crate::api::goal::get_goal,
        crate::api::goal::goal_list,
        crate::api::goal::update_goal,
        crate::api::goal::delete_goal,

        crate::api::task::create_task,
        crate::api::task::get_task,
        crate::api::task::task_list,
        crate::api::task::update_task,
        crate::api::task::delete_task,

        crate::api::course::create_course,
        crate::api::course::list_courses,

        crate::api::enrollment::enroll,
        crate::api::enrollment::complete_enrollment,
        crate::api::enrollment::drop_enrollment,
        crate::api::enrollment::enrollment_list,
        crate::api::enrollment::repair_duplicate_enrollments,

        crate::api::settings::get_work_settings,
        crate::api::settings::update_work_settings,

        crate::api::notification::notification_list,
        crate::api::notification::mark_read
    ),
    components(
        schemas(
            Attendance,
            AttendanceFilter,
            AttendanceListResponse,
            CheckInReq,
            ExportQuery,
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Student,
            CreateStudent,
            StudentQuery,
            StudentListResponse,
            Goal,
            CreateGoal,
            UpdateGoal,
            GoalFilter,
            GoalListResponse,
            GoalWithTasks,
            Task,
            CreateTask,
            UpdateTask,
            TaskFilter,
            TaskListResponse,
            Course,
            CreateCourse,
            CourseQuery,
            CourseListResponse,
            CourseEnrollment,
            EnrollReq,
            EnrollmentFilter,
            EnrollmentListResponse,
            WorkSettings,
            UpdateWorkSettings,
            Notification,
            NotificationQuery,
            NotificationListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Student", description = "Student management APIs"),
        (name = "Goal", description = "Goal management APIs"),
        (name = "Task", description = "Task management APIs"),
        (name = "Course", description = "Course catalog APIs"),
        (name = "Enrollment", description = "Course enrollment APIs"),
        (name = "Settings", description = "Work settings APIs"),
        (name = "Notification", description = "Notification APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
