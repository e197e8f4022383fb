use crate::config::CartFile;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Rear,
    Front,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Rear, Side::Front];

    fn sign(self) -> f32 {
        match self {
            Side::Rear => -1.0,
            Side::Front => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Rear => "Rear",
            Side::Front => "Front",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RigMember {
    Chassis,
    ShockBase(Side),
    ShockRod(Side),
    Wheel(Side),
}

impl RigMember {
    pub fn name(self) -> String {
        match self {
            RigMember::Chassis => "CartChassis".to_string(),
            RigMember::ShockBase(side) => format!("CartShockBase{}", side.label()),
            RigMember::ShockRod(side) => format!("CartShockRod{}", side.label()),
            RigMember::Wheel(side) => format!("CartWheel{}", side.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberShape {
    Cuboid { half_extents: Vec2 },
    Ball { radius: f32 },
}

impl MemberShape {
    pub fn collider(self) -> Collider {
        match self {
            MemberShape::Cuboid { half_extents } => {
                Collider::cuboid(half_extents.x, half_extents.y)
            }
            MemberShape::Ball { radius } => Collider::ball(radius),
        }
    }

    fn half_extents(self) -> Vec2 {
        match self {
            MemberShape::Cuboid { half_extents } => half_extents,
            MemberShape::Ball { radius } => Vec2::splat(radius),
        }
    }
}

/// Bounds of the rig at rest, relative to its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigFootprint {
    pub half_width: f32,
    /// Lowest point of any member; negative below the origin.
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberBlueprint {
    pub member: RigMember,
    /// Rest position relative to the rig origin (the chassis center).
    pub offset: Vec2,
    pub shape: MemberShape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotMotor {
    pub target_speed: f32,
    pub max_torque: f32,
    pub factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    /// Rigid attachment.
    Weld,
    /// Weld that springs back to the rest pose along the local y axis.
    SoftWeld { stiffness: f32, damping: f32 },
    /// One translational degree of freedom along `axis`, limited to `limits`.
    Piston { axis: Vec2, limits: [f32; 2] },
    /// One rotational degree of freedom, optionally motorized.
    Pivot { motor: Option<PivotMotor> },
    /// Fixed separation between the two anchors.
    Distance { length: f32 },
}

impl JointKind {
    pub fn label(&self) -> &'static str {
        match self {
            JointKind::Weld => "weld",
            JointKind::SoftWeld { .. } => "soft_weld",
            JointKind::Piston { .. } => "piston",
            JointKind::Pivot { .. } => "pivot",
            JointKind::Distance { .. } => "distance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointBlueprint {
    pub kind: JointKind,
    pub body_a: RigMember,
    pub body_b: RigMember,
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
}

impl JointBlueprint {
    pub fn motor(&self) -> Option<PivotMotor> {
        match self.kind {
            JointKind::Pivot { motor } => motor,
            _ => None,
        }
    }

    pub fn to_typed_joint(&self) -> TypedJoint {
        match self.kind {
            JointKind::Weld => FixedJointBuilder::new()
                .local_anchor1(self.anchor_a)
                .local_anchor2(self.anchor_b)
                .build()
                .into(),
            JointKind::SoftWeld { stiffness, damping } => {
                TypedJoint::GenericJoint(
                    GenericJointBuilder::new(JointAxesMask::empty())
                        .local_anchor1(self.anchor_a)
                        .local_anchor2(self.anchor_b)
                        .motor_position(JointAxis::LinY, 0.0, stiffness, damping)
                        .build(),
                )
            }
            JointKind::Piston { axis, limits } => PrismaticJointBuilder::new(axis)
                .local_anchor1(self.anchor_a)
                .local_anchor2(self.anchor_b)
                .limits(limits)
                .build()
                .into(),
            JointKind::Pivot { motor } => {
                let mut builder = RevoluteJointBuilder::new()
                    .local_anchor1(self.anchor_a)
                    .local_anchor2(self.anchor_b);
                if let Some(motor) = motor {
                    builder = builder
                        .motor_velocity(motor.target_speed, motor.factor)
                        .motor_max_force(motor.max_torque);
                }
                builder.build().into()
            }
            JointKind::Distance { length } => TypedJoint::GenericJoint(
                GenericJointBuilder::new(JointAxesMask::empty())
                    .coupled_axes(JointAxesMask::LIN_AXES)
                    .limits(JointAxis::LinX, [length, length])
                    .local_anchor1(self.anchor_a)
                    .local_anchor2(self.anchor_b)
                    .build(),
            ),
        }
    }
}

/// Body and joint layout of the cart, relative to its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CartBlueprint {
    pub members: Vec<MemberBlueprint>,
    pub joints: Vec<JointBlueprint>,
}

impl CartBlueprint {
    pub fn from_config(cart: &CartFile) -> Self {
        let suspension = &cart.suspension;
        let wheel = &cart.wheel;
        let damping = &cart.damping;
        let rod_half_height = suspension.rod_size[1] * 0.5;

        let mut members = vec![MemberBlueprint {
            member: RigMember::Chassis,
            offset: Vec2::ZERO,
            shape: MemberShape::Cuboid {
                half_extents: Vec2::from(cart.chassis.size) * 0.5,
            },
            density: cart.chassis.density,
            friction: cart.chassis.friction,
            restitution: cart.chassis.restitution,
            linear_damping: 0.0,
            angular_damping: damping.chassis_angular,
        }];

        for side in Side::BOTH {
            let mount_x = suspension.mount_x * side.sign();
            members.push(MemberBlueprint {
                member: RigMember::ShockBase(side),
                offset: Vec2::new(mount_x, suspension.base_offset_y),
                shape: MemberShape::Cuboid {
                    half_extents: Vec2::from(suspension.base_size) * 0.5,
                },
                density: suspension.density,
                friction: cart.chassis.friction,
                restitution: 0.0,
                linear_damping: damping.base_linear,
                angular_damping: 0.0,
            });
            members.push(MemberBlueprint {
                member: RigMember::ShockRod(side),
                offset: Vec2::new(mount_x, suspension.rod_offset_y),
                shape: MemberShape::Cuboid {
                    half_extents: Vec2::from(suspension.rod_size) * 0.5,
                },
                density: suspension.density,
                friction: cart.chassis.friction,
                restitution: 0.0,
                linear_damping: damping.rod_linear,
                angular_damping: damping.rod_angular,
            });
            members.push(MemberBlueprint {
                member: RigMember::Wheel(side),
                offset: Vec2::new(mount_x, suspension.rod_offset_y - rod_half_height),
                shape: MemberShape::Ball {
                    radius: wheel.radius,
                },
                density: wheel.density,
                friction: wheel.friction,
                restitution: wheel.restitution,
                linear_damping: 0.0,
                angular_damping: 0.0,
            });
        }

        let rod_from_base = Vec2::new(0.0, suspension.base_offset_y - suspension.rod_offset_y);
        let motor = PivotMotor {
            target_speed: 0.0,
            max_torque: cart.motor.max_torque,
            factor: cart.motor.motor_factor,
        };

        let mut joints = Vec::with_capacity(9);
        for side in Side::BOTH {
            let base_offset = Vec2::new(suspension.mount_x * side.sign(), suspension.base_offset_y);
            joints.push(JointBlueprint {
                kind: JointKind::Weld,
                body_a: RigMember::Chassis,
                body_b: RigMember::ShockBase(side),
                anchor_a: base_offset,
                anchor_b: Vec2::ZERO,
            });
            joints.push(JointBlueprint {
                kind: JointKind::Piston {
                    axis: Vec2::Y,
                    limits: [0.0, suspension.travel],
                },
                body_a: RigMember::ShockBase(side),
                body_b: RigMember::ShockRod(side),
                anchor_a: Vec2::ZERO,
                anchor_b: rod_from_base,
            });
            joints.push(JointBlueprint {
                kind: JointKind::SoftWeld {
                    stiffness: suspension.spring_stiffness,
                    damping: suspension.spring_damping,
                },
                body_a: RigMember::ShockBase(side),
                body_b: RigMember::ShockRod(side),
                anchor_a: Vec2::ZERO,
                anchor_b: rod_from_base,
            });
            joints.push(JointBlueprint {
                kind: JointKind::Pivot { motor: Some(motor) },
                body_a: RigMember::ShockRod(side),
                body_b: RigMember::Wheel(side),
                anchor_a: Vec2::new(0.0, -rod_half_height),
                anchor_b: Vec2::ZERO,
            });
        }
        joints.push(JointBlueprint {
            kind: JointKind::Distance {
                length: suspension.mount_x * 2.0,
            },
            body_a: RigMember::Wheel(Side::Rear),
            body_b: RigMember::Wheel(Side::Front),
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
        });

        Self { members, joints }
    }

    pub fn member(&self, member: RigMember) -> Option<&MemberBlueprint> {
        self.members.iter().find(|entry| entry.member == member)
    }

    pub fn footprint(&self) -> RigFootprint {
        self.members.iter().fold(
            RigFootprint {
                half_width: 0.0,
                bottom: 0.0,
            },
            |footprint, member| {
                let extents = member.shape.half_extents();
                RigFootprint {
                    half_width: footprint.half_width.max(member.offset.x.abs() + extents.x),
                    bottom: footprint.bottom.min(member.offset.y - extents.y),
                }
            },
        )
    }

    pub fn motorized_pivots(&self) -> impl Iterator<Item = &JointBlueprint> {
        self.joints.iter().filter(|joint| joint.motor().is_some())
    }
}

/// World position a member returns to on reset: horizontal progress is kept, height is the rest
/// height of the rig origin.
pub fn reset_position(chassis_x: f32, origin_y: f32, rest_offset: Vec2) -> Vec2 {
    Vec2::new(chassis_x + rest_offset.x, origin_y + rest_offset.y)
}

/// Origin height for a reset: the construction height, raised when the ground under the rig
/// would otherwise cut into its footprint.
pub fn reset_height(
    origin_y: f32,
    footprint: RigFootprint,
    ground: Option<f32>,
    clearance: f32,
) -> f32 {
    match ground {
        Some(ground) => origin_y.max(ground + clearance - footprint.bottom),
        None => origin_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::shipped_config;

    fn blueprint() -> CartBlueprint {
        CartBlueprint::from_config(&shipped_config().cart)
    }

    #[test]
    fn rig_has_seven_bodies() {
        let blueprint = blueprint();

        assert_eq!(blueprint.members.len(), 7);
        for side in Side::BOTH {
            assert!(blueprint.member(RigMember::ShockBase(side)).is_some());
            assert!(blueprint.member(RigMember::ShockRod(side)).is_some());
            assert!(blueprint.member(RigMember::Wheel(side)).is_some());
        }
    }

    #[test]
    fn joint_inventory_matches_layout() {
        let blueprint = blueprint();
        let count = |label: &str| {
            blueprint
                .joints
                .iter()
                .filter(|joint| joint.kind.label() == label)
                .count()
        };

        assert_eq!(count("weld"), 2);
        assert_eq!(count("soft_weld"), 2);
        assert_eq!(count("piston"), 2);
        assert_eq!(count("pivot"), 2);
        assert_eq!(count("distance"), 1);
    }

    #[test]
    fn exactly_two_motorized_pivots_share_torque_ceiling() {
        let config = shipped_config();
        let blueprint = CartBlueprint::from_config(&config.cart);

        let motors: Vec<PivotMotor> = blueprint
            .motorized_pivots()
            .filter_map(JointBlueprint::motor)
            .collect();

        assert_eq!(motors.len(), 2);
        for motor in motors {
            assert_eq!(motor.target_speed, 0.0);
            assert_eq!(motor.max_torque, config.cart.motor.max_torque);
            assert!(motor.max_torque > 0.0);
        }
    }

    #[test]
    fn welds_bind_chassis_to_each_shock_base() {
        let blueprint = blueprint();

        for side in Side::BOTH {
            let weld = blueprint
                .joints
                .iter()
                .find(|joint| {
                    joint.kind == JointKind::Weld && joint.body_b == RigMember::ShockBase(side)
                })
                .expect("each shock base is welded");
            let base = blueprint
                .member(RigMember::ShockBase(side))
                .expect("base exists");

            assert_eq!(weld.body_a, RigMember::Chassis);
            assert_eq!(weld.anchor_a, base.offset);
        }
    }

    #[test]
    fn piston_travel_spans_configured_range() {
        let config = shipped_config();
        let blueprint = CartBlueprint::from_config(&config.cart);

        let pistons: Vec<_> = blueprint
            .joints
            .iter()
            .filter_map(|joint| match joint.kind {
                JointKind::Piston { axis, limits } => Some((axis, limits)),
                _ => None,
            })
            .collect();

        assert_eq!(pistons.len(), 2);
        for (axis, limits) in pistons {
            assert_eq!(axis, Vec2::Y);
            assert_eq!(limits, [0.0, config.cart.suspension.travel]);
        }
    }

    #[test]
    fn distance_joint_keeps_wheelbase() {
        let blueprint = blueprint();
        let rear = blueprint.member(RigMember::Wheel(Side::Rear)).unwrap();
        let front = blueprint.member(RigMember::Wheel(Side::Front)).unwrap();

        let distance = blueprint
            .joints
            .iter()
            .find_map(|joint| match joint.kind {
                JointKind::Distance { length } => Some(length),
                _ => None,
            })
            .expect("wheelbase joint exists");

        assert_eq!(distance, rear.offset.distance(front.offset));
    }

    #[test]
    fn wheel_axle_sits_at_rod_bottom() {
        let config = shipped_config();
        let blueprint = CartBlueprint::from_config(&config.cart);

        for side in Side::BOTH {
            let rod = blueprint.member(RigMember::ShockRod(side)).unwrap();
            let wheel = blueprint.member(RigMember::Wheel(side)).unwrap();
            let pivot = blueprint
                .joints
                .iter()
                .find(|joint| joint.body_b == RigMember::Wheel(side) && joint.motor().is_some())
                .unwrap();

            assert_eq!(rod.offset + pivot.anchor_a, wheel.offset);
        }
    }

    #[test]
    fn footprint_spans_wheels_and_chassis() {
        let footprint = blueprint().footprint();

        assert_eq!(footprint.half_width, 61.0);
        assert_eq!(footprint.bottom, -60.0);
    }

    #[test]
    fn reset_height_clears_high_ground_only() {
        let footprint = RigFootprint {
            half_width: 61.0,
            bottom: -60.0,
        };

        assert_eq!(reset_height(180.0, footprint, Some(100.0), 4.0), 180.0);
        assert_eq!(reset_height(180.0, footprint, Some(240.0), 4.0), 304.0);
        assert_eq!(reset_height(180.0, footprint, None, 4.0), 180.0);
    }

    #[test]
    fn damping_follows_member_role() {
        let config = shipped_config();
        let blueprint = CartBlueprint::from_config(&config.cart);
        let chassis = blueprint.member(RigMember::Chassis).unwrap();
        let base = blueprint.member(RigMember::ShockBase(Side::Rear)).unwrap();
        let rod = blueprint.member(RigMember::ShockRod(Side::Front)).unwrap();

        assert_eq!(chassis.angular_damping, config.cart.damping.chassis_angular);
        assert_eq!(base.linear_damping, config.cart.damping.base_linear);
        assert_eq!(base.angular_damping, 0.0);
        assert_eq!(rod.linear_damping, config.cart.damping.rod_linear);
        assert_eq!(rod.angular_damping, config.cart.damping.rod_angular);
    }

    #[test]
    fn reset_keeps_progress_and_restores_rest_height() {
        let position = reset_position(1234.0, 180.0, Vec2::new(-45.0, -44.0));

        assert_eq!(position, Vec2::new(1189.0, 136.0));
    }
}
