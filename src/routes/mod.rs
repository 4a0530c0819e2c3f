/// Router Module Index
///
/// Routes are grouped by the gate prefix that protects them, so each module's access rule
/// can be read off its file name. The gate itself is applied once, around the merged router.

/// Routes outside every gated prefix: health, sign-in, and the payment webhook.
/// The root `/` lives here too; the gate only lets sessions through to it.
pub mod public;

/// `/dashboard/*`: any signed-in user type.
pub mod dashboard;

/// `/tenants/*`: system_admin only.
pub mod tenants;

/// `/settings/*`: tenant_owner only.
pub mod settings;
