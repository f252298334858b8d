// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use crate::error::AuthError;
use crate::rooms::Room;
use lastmile_domain::{DriverId, Stop};

/// Actor roles for authorization.
///
/// Roles determine what actions an authenticated actor may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Admin role: dispatchers with structural and corrective authority.
    ///
    /// Admins may:
    /// - build, edit, and delete routes and stops
    /// - reassign and resequence stops
    /// - override stop status outside the driver-facing machine
    /// - observe any room
    Admin,
    /// Driver role: the operator executing deliveries on their own stops.
    ///
    /// Drivers may:
    /// - advance their own stops through the status machine
    /// - record completion artifacts (documents, images, payments, notes)
    /// - observe only their own driver room
    Driver,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Driver => "driver",
        }
    }
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The role assigned to this actor.
    pub role: Role,
    /// The driver identity, present only for driver actors.
    pub driver_id: Option<DriverId>,
}

impl AuthenticatedActor {
    /// Creates an admin actor.
    #[must_use]
    pub const fn admin(id: String) -> Self {
        Self {
            id,
            role: Role::Admin,
            driver_id: None,
        }
    }

    /// Creates a driver actor.
    #[must_use]
    pub const fn driver(id: String, driver_id: DriverId) -> Self {
        Self {
            id,
            role: Role::Driver,
            driver_id: Some(driver_id),
        }
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks if an actor may join a room.
    ///
    /// A driver may only join their own `driver:{id}` room. Admins may join
    /// any room.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor may not join the room.
    pub fn authorize_join_room(actor: &AuthenticatedActor, room: Room) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Driver => match room {
                Room::Driver(driver_id) if actor.driver_id == Some(driver_id) => Ok(()),
                Room::Admin | Room::Route(_) | Room::Driver(_) => Err(AuthError::Unauthorized {
                    action: format!("join room '{room}'"),
                    required_role: String::from("Admin"),
                }),
            },
        }
    }

    /// Checks if an actor may act on a stop through the driver-facing
    /// machine.
    ///
    /// Drivers must own the stop; admins pass.
    ///
    /// # Errors
    ///
    /// Returns an error if a driver acts on a stop assigned elsewhere.
    pub fn authorize_stop_action(
        actor: &AuthenticatedActor,
        stop: &Stop,
        action: &str,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Driver => {
                if actor.driver_id.is_some() && stop.driver_id == actor.driver_id {
                    Ok(())
                } else {
                    Err(AuthError::Unauthorized {
                        action: action.to_string(),
                        required_role: String::from("assigned Driver or Admin"),
                    })
                }
            }
        }
    }

    /// Checks if an actor may override a stop's status.
    ///
    /// The override bypasses the state machine; only Admins may use it.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_override_status(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "override_stop_status")
    }

    /// Checks if an actor may build or edit routes and stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_manage_routes(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "manage_routes")
    }

    /// Checks if an actor may delete a route, forced or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_delete_route(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "delete_route")
    }

    /// Checks if an actor may add admin notes.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not have the Admin role.
    pub fn authorize_add_admin_note(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "add_admin_note")
    }

    fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Driver => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Admin"),
            }),
        }
    }
}
