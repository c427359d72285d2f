use crate::api::department::{CreateDepartment, UpdateDepartment};
use crate::api::employee::{
    CreateEmployee, EmployeeExpanded, EmployeeListResponse, ExpandedListResponse, Tenure,
    TransferDepartment, UpdateEmployee, UpdateSalary,
};
use crate::import::ImportSummary;
use crate::model::department::Department;
use crate::model::employee::Employee;
use crate::models::{LoginReqDto, PublicUser, RegisterUserReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Records API",
        version = "1.0.0",
        description = r#"
## HR Record-Keeping API

CRUD over Employees and Departments, bulk CSV/JSON employee import,
salary/transfer/soft-delete operations, and user accounts linked 1:1 to
employee records.

### Security
Protected endpoints require **HTTP Basic** credentials of a registered user.
Admin role is required for deletes and unscoped search.

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::update_salary,
        crate::api::employee::transfer_department,
        crate::api::employee::get_tenure,
        crate::api::employee::search_employees,
        crate::import::bulk_import,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,
        crate::api::department::department_employees,

        crate::api::user::register,
        crate::api::user::login
    ),
    components(
        schemas(
            Employee,
            EmployeeExpanded,
            EmployeeListResponse,
            ExpandedListResponse,
            CreateEmployee,
            UpdateEmployee,
            UpdateSalary,
            TransferDepartment,
            Tenure,
            ImportSummary,
            Department,
            CreateDepartment,
            UpdateDepartment,
            RegisterUserReq,
            LoginReqDto,
            PublicUser
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "User", description = "User registration and login"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}
