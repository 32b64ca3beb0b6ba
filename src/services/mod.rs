pub mod announcement_service;
pub mod device_service;

pub use announcement_service::{AnnouncementDto, AnnouncementError, AnnouncementService};
pub use device_service::{DeviceDto, DeviceError, DeviceService};
