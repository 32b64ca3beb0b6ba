pub mod announcement;
pub mod device;
pub mod user;

pub use announcement::Announcement;
pub use device::Device;
pub use user::User;

use crate::database::factory::{Crud, JsonQueryable};

pub type DeviceRepository = JsonQueryable<Device>;
pub type AnnouncementRepository = JsonQueryable<Announcement>;
pub type UserRepository = Crud<User>;
