pub mod plan;
pub mod secret;

pub use plan::{
    ROOT_PASSWORD_ENV, SERVICE_COMMAND, SERVICE_NAME, ServicePlan, Startup, build_service_plan,
};
pub use secret::{ROOT_PASSWORD_LEN, generate_password};
