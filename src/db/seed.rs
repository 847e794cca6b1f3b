//! Demo roster for a fresh database.

use crate::errors::AppError;
use crate::models::{AvailabilitySlot, CreateStaffRequest, Day, Role, ShiftType};

use super::Repository;

struct DemoStaff {
    name: &'static str,
    role: Role,
    phone: &'static str,
    email: &'static str,
    availability: &'static [(Day, ShiftType)],
}

use Day::*;
use ShiftType::*;

const DEMO_STAFF: [DemoStaff; 5] = [
    DemoStaff {
        name: "Nguyễn Văn A",
        role: Role::Manager,
        phone: "0901234567",
        email: "vana@coffeeos.vn",
        availability: &[
            (Monday, Morning),
            (Monday, Afternoon),
            (Tuesday, Morning),
            (Wednesday, Morning),
            (Thursday, Morning),
            (Friday, Morning),
        ],
    },
    DemoStaff {
        name: "Trần Thị B",
        role: Role::Barista,
        phone: "0909888777",
        email: "thib@coffeeos.vn",
        availability: &[
            (Monday, Morning),
            (Monday, Evening),
            (Wednesday, Evening),
            (Thursday, Evening),
            (Friday, Evening),
            (Saturday, Morning),
            (Sunday, Morning),
        ],
    },
    DemoStaff {
        name: "Lê Văn C",
        role: Role::Barista,
        phone: "0912345678",
        email: "vanc@coffeeos.vn",
        availability: &[
            (Tuesday, Afternoon),
            (Wednesday, Afternoon),
            (Thursday, Afternoon),
            (Friday, Afternoon),
            (Saturday, Evening),
            (Sunday, Evening),
        ],
    },
    DemoStaff {
        name: "Phạm Thị D",
        role: Role::Server,
        phone: "0933444555",
        email: "thid@coffeeos.vn",
        availability: &[
            (Monday, Evening),
            (Tuesday, Evening),
            (Wednesday, Evening),
            (Saturday, Afternoon),
            (Sunday, Afternoon),
        ],
    },
    DemoStaff {
        name: "Hoàng Văn E",
        role: Role::Server,
        phone: "0944555666",
        email: "vane@coffeeos.vn",
        availability: &[
            (Monday, Morning),
            (Tuesday, Morning),
            (Wednesday, Morning),
            (Thursday, Morning),
            (Friday, Morning),
        ],
    },
];

/// Insert the demo roster if no staff exist yet. Returns how many were added.
pub async fn seed_demo_staff(repo: &Repository) -> Result<usize, AppError> {
    if !repo.list_staff().await?.is_empty() {
        tracing::debug!("Staff table not empty, skipping demo seed");
        return Ok(0);
    }

    for (i, demo) in DEMO_STAFF.iter().enumerate() {
        let request = CreateStaffRequest {
            name: demo.name.to_string(),
            role: demo.role,
            phone: Some(demo.phone.to_string()),
            email: Some(demo.email.to_string()),
            avatar: Some(format!("https://picsum.photos/100/100?random={}", i + 1)),
            availability: demo
                .availability
                .iter()
                .map(|(day, shift)| AvailabilitySlot::new(*day, *shift))
                .collect(),
        };
        repo.create_staff(&request).await?;
    }

    tracing::info!("Seeded {} demo staff", DEMO_STAFF.len());
    Ok(DEMO_STAFF.len())
}
