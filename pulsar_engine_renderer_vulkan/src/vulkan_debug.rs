/// Vulkan debug messenger - validation layer messages with colored output
///
/// Compiled only with the `vulkan-validation` feature.

use ash::vk;
use colored::*;
use pulsar_engine::engine_err;
use pulsar_engine::pulsar::{Error, Result};
use std::ffi::CStr;

const SOURCE: &str = "pulsar::vulkan";

/// Create the debug utils messenger reporting warnings and errors
pub(crate) fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);

    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    let messenger = unsafe {
        loader
            .create_debug_utils_messenger(&create_info, None)
            .map_err(|e| {
                engine_err!(
                    SOURCE,
                    Error::InitializationFailed,
                    "Failed to create debug messenger: {:?}",
                    e
                )
            })?
    };

    Ok((loader, messenger))
}

/// Vulkan debug messenger callback
///
/// Called by the validation layers when they detect issues. Formats and
/// prints the message with colors to stderr.
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let severity_colored =
        if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            "ERROR".red().bold()
        } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            "WARNING".yellow().bold()
        } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            "INFO".cyan()
        } else {
            "VERBOSE".bright_black()
        };

    let type_str = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    };

    eprint!(
        "{} {} [{}]\n  ├─ {}: {}\n  └─ {}\n",
        "[VULKAN".bright_blue().bold(),
        format!("{}]", severity_colored).bright_blue().bold(),
        type_str.bright_black(),
        "Message ID".bright_black(),
        message_id_name.white(),
        message.white()
    );

    // Don't abort Vulkan execution
    vk::FALSE
}
