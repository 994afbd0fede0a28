// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The operation registry: which services exist and which commands each
//! one answers.
//!
//! Lookups are closed-world. An unknown service or method is a caller
//! error surfaced before any network traffic, not a runtime panic.
//!
//! Naming follows the ONVIF WSDLs: device-management roots are written
//! unprefixed (the device service resolves them against its default
//! namespace), media/imaging/ptz roots carry their `trt:`/`timg:`/`tptz:`
//! prefixes, and nested common types use `tt:`.

use super::{FieldSpec, Schema};

/// The ONVIF services this client can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Device,
    Media,
    Imaging,
    Ptz,
}

impl Service {
    /// Canonical lowercase name, as used for endpoint lookup.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Device => "device",
            Service::Media => "media",
            Service::Imaging => "imaging",
            Service::Ptz => "ptz",
        }
    }

    /// Resolve a caller-supplied service name. Case-insensitive.
    pub fn parse(name: &str) -> Option<Service> {
        match name.to_ascii_lowercase().as_str() {
            "device" => Some(Service::Device),
            "media" => Some(Service::Media),
            "imaging" => Some(Service::Imaging),
            "ptz" => Some(Service::Ptz),
            _ => None,
        }
    }
}

/// One registered command: its request descriptor and, where the reply
/// is worth decoding, the local name of the reply's payload element.
#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub request: &'static Schema,
    pub response_root: Option<&'static str>,
}

/// Find an operation in a service's table.
pub fn lookup(service: Service, method: &str) -> Option<&'static Operation> {
    let table = match service {
        Service::Device => DEVICE_OPERATIONS,
        Service::Media => MEDIA_OPERATIONS,
        Service::Imaging => IMAGING_OPERATIONS,
        Service::Ptz => PTZ_OPERATIONS,
    };
    table.iter().find(|op| op.name == method)
}

// =======================================================================
// Device management
// =======================================================================

static GET_SYSTEM_DATE_AND_TIME: Schema = Schema {
    fields: &[FieldSpec {
        field: "XMLName",
        meta: "xml:\"GetSystemDateAndTime\"",
        children: None,
    }],
};

static GET_CAPABILITIES: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"GetCapabilities\"", children: None },
        FieldSpec { field: "Category", meta: "xml:\"Category,omitempty\"", children: None },
    ],
};

static GET_DEVICE_INFORMATION: Schema = Schema {
    fields: &[FieldSpec {
        field: "XMLName",
        meta: "xml:\"GetDeviceInformation\"",
        children: None,
    }],
};

static GET_SERVICES: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"GetServices\"", children: None },
        FieldSpec {
            field: "IncludeCapability",
            meta: "xml:\"IncludeCapability,omitempty\"",
            children: None,
        },
    ],
};

static GET_SCOPES: Schema = Schema {
    fields: &[FieldSpec { field: "XMLName", meta: "xml:\"GetScopes\"", children: None }],
};

static GET_NETWORK_INTERFACES: Schema = Schema {
    fields: &[FieldSpec {
        field: "XMLName",
        meta: "xml:\"GetNetworkInterfaces\"",
        children: None,
    }],
};

static GET_USERS: Schema = Schema {
    fields: &[FieldSpec { field: "XMLName", meta: "xml:\"GetUsers\"", children: None }],
};

static SYSTEM_REBOOT: Schema = Schema {
    fields: &[FieldSpec { field: "XMLName", meta: "xml:\"SystemReboot\"", children: None }],
};

static DEVICE_OPERATIONS: &[Operation] = &[
    Operation {
        name: "GetSystemDateAndTime",
        request: &GET_SYSTEM_DATE_AND_TIME,
        response_root: Some("GetSystemDateAndTimeResponse"),
    },
    Operation {
        name: "GetCapabilities",
        request: &GET_CAPABILITIES,
        response_root: Some("GetCapabilitiesResponse"),
    },
    Operation {
        name: "GetDeviceInformation",
        request: &GET_DEVICE_INFORMATION,
        response_root: Some("GetDeviceInformationResponse"),
    },
    Operation {
        name: "GetServices",
        request: &GET_SERVICES,
        response_root: Some("GetServicesResponse"),
    },
    Operation {
        name: "GetScopes",
        request: &GET_SCOPES,
        response_root: Some("GetScopesResponse"),
    },
    Operation {
        name: "GetNetworkInterfaces",
        request: &GET_NETWORK_INTERFACES,
        response_root: Some("GetNetworkInterfacesResponse"),
    },
    Operation {
        name: "GetUsers",
        request: &GET_USERS,
        response_root: Some("GetUsersResponse"),
    },
    Operation { name: "SystemReboot", request: &SYSTEM_REBOOT, response_root: None },
];

// =======================================================================
// Media
// =======================================================================

static GET_PROFILES: Schema = Schema {
    fields: &[FieldSpec { field: "XMLName", meta: "xml:\"trt:GetProfiles\"", children: None }],
};

static STREAM_TRANSPORT: Schema = Schema {
    fields: &[FieldSpec {
        field: "Protocol",
        meta: "xml:\"tt:Protocol\"",
        children: None,
    }],
};

static STREAM_SETUP: Schema = Schema {
    fields: &[
        FieldSpec { field: "Stream", meta: "xml:\"tt:Stream\"", children: None },
        FieldSpec {
            field: "Transport",
            meta: "xml:\"tt:Transport\"",
            children: Some(&STREAM_TRANSPORT),
        },
    ],
};

static GET_STREAM_URI: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"trt:GetStreamUri\"", children: None },
        FieldSpec {
            field: "StreamSetup",
            meta: "xml:\"trt:StreamSetup\"",
            children: Some(&STREAM_SETUP),
        },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"trt:ProfileToken\"",
            children: None,
        },
    ],
};

static GET_SNAPSHOT_URI: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"trt:GetSnapshotUri\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"trt:ProfileToken\"",
            children: None,
        },
    ],
};

static GET_VIDEO_SOURCES: Schema = Schema {
    fields: &[FieldSpec {
        field: "XMLName",
        meta: "xml:\"trt:GetVideoSources\"",
        children: None,
    }],
};

static MEDIA_OPERATIONS: &[Operation] = &[
    Operation {
        name: "GetProfiles",
        request: &GET_PROFILES,
        response_root: Some("GetProfilesResponse"),
    },
    Operation {
        name: "GetStreamUri",
        request: &GET_STREAM_URI,
        response_root: Some("GetStreamUriResponse"),
    },
    Operation {
        name: "GetSnapshotUri",
        request: &GET_SNAPSHOT_URI,
        response_root: Some("GetSnapshotUriResponse"),
    },
    Operation {
        name: "GetVideoSources",
        request: &GET_VIDEO_SOURCES,
        response_root: Some("GetVideoSourcesResponse"),
    },
];

// =======================================================================
// Imaging
// =======================================================================

static GET_IMAGING_SETTINGS: Schema = Schema {
    fields: &[
        FieldSpec {
            field: "XMLName",
            meta: "xml:\"timg:GetImagingSettings\"",
            children: None,
        },
        FieldSpec {
            field: "VideoSourceToken",
            meta: "xml:\"timg:VideoSourceToken\"",
            children: None,
        },
    ],
};

static GET_IMAGING_OPTIONS: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"timg:GetOptions\"", children: None },
        FieldSpec {
            field: "VideoSourceToken",
            meta: "xml:\"timg:VideoSourceToken\"",
            children: None,
        },
    ],
};

static GET_MOVE_OPTIONS: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"timg:GetMoveOptions\"", children: None },
        FieldSpec {
            field: "VideoSourceToken",
            meta: "xml:\"timg:VideoSourceToken\"",
            children: None,
        },
    ],
};

static IMAGING_OPERATIONS: &[Operation] = &[
    Operation {
        name: "GetImagingSettings",
        request: &GET_IMAGING_SETTINGS,
        response_root: Some("GetImagingSettingsResponse"),
    },
    Operation {
        name: "GetOptions",
        request: &GET_IMAGING_OPTIONS,
        response_root: Some("GetOptionsResponse"),
    },
    Operation {
        name: "GetMoveOptions",
        request: &GET_MOVE_OPTIONS,
        response_root: Some("GetMoveOptionsResponse"),
    },
];

// =======================================================================
// PTZ
// =======================================================================

static PAN_TILT: Schema = Schema {
    fields: &[
        FieldSpec { field: "X", meta: "xml:\"x,attr\"", children: None },
        FieldSpec { field: "Y", meta: "xml:\"y,attr\"", children: None },
        FieldSpec { field: "Space", meta: "xml:\"space,attr,omitempty\"", children: None },
    ],
};

static ZOOM: Schema = Schema {
    fields: &[
        FieldSpec { field: "X", meta: "xml:\"x,attr\"", children: None },
        FieldSpec { field: "Space", meta: "xml:\"space,attr,omitempty\"", children: None },
    ],
};

static PTZ_SPEED: Schema = Schema {
    fields: &[
        FieldSpec { field: "PanTilt", meta: "xml:\"tt:PanTilt\"", children: Some(&PAN_TILT) },
        FieldSpec { field: "Zoom", meta: "xml:\"tt:Zoom\"", children: Some(&ZOOM) },
    ],
};

static PTZ_VECTOR: Schema = Schema {
    fields: &[
        FieldSpec { field: "PanTilt", meta: "xml:\"tt:PanTilt\"", children: Some(&PAN_TILT) },
        FieldSpec { field: "Zoom", meta: "xml:\"tt:Zoom\"", children: Some(&ZOOM) },
    ],
};

static GET_CONFIGURATIONS: Schema = Schema {
    fields: &[FieldSpec {
        field: "XMLName",
        meta: "xml:\"tptz:GetConfigurations\"",
        children: None,
    }],
};

static CONTINUOUS_MOVE: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"tptz:ContinuousMove\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"tptz:ProfileToken\"",
            children: None,
        },
        FieldSpec {
            field: "Velocity",
            meta: "xml:\"tptz:Velocity\"",
            children: Some(&PTZ_SPEED),
        },
    ],
};

static ABSOLUTE_MOVE: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"tptz:AbsoluteMove\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"tptz:ProfileToken\"",
            children: None,
        },
        FieldSpec {
            field: "Position",
            meta: "xml:\"tptz:Position\"",
            children: Some(&PTZ_VECTOR),
        },
        FieldSpec {
            field: "Speed",
            meta: "xml:\"tptz:Speed,omitempty\"",
            children: Some(&PTZ_SPEED),
        },
    ],
};

static RELATIVE_MOVE: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"tptz:RelativeMove\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"tptz:ProfileToken\"",
            children: None,
        },
        FieldSpec {
            field: "Translation",
            meta: "xml:\"tptz:Translation\"",
            children: Some(&PTZ_VECTOR),
        },
        FieldSpec {
            field: "Speed",
            meta: "xml:\"tptz:Speed,omitempty\"",
            children: Some(&PTZ_SPEED),
        },
    ],
};

static PTZ_STOP: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"tptz:Stop\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"tptz:ProfileToken\"",
            children: None,
        },
        FieldSpec { field: "PanTilt", meta: "xml:\"tptz:PanTilt,omitempty\"", children: None },
        FieldSpec { field: "Zoom", meta: "xml:\"tptz:Zoom,omitempty\"", children: None },
    ],
};

static GOTO_HOME_POSITION: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"tptz:GotoHomePosition\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"tptz:ProfileToken\"",
            children: None,
        },
        FieldSpec {
            field: "Speed",
            meta: "xml:\"tptz:Speed,omitempty\"",
            children: Some(&PTZ_SPEED),
        },
    ],
};

static GET_PTZ_STATUS: Schema = Schema {
    fields: &[
        FieldSpec { field: "XMLName", meta: "xml:\"tptz:GetStatus\"", children: None },
        FieldSpec {
            field: "ProfileToken",
            meta: "xml:\"tptz:ProfileToken\"",
            children: None,
        },
    ],
};

static PTZ_OPERATIONS: &[Operation] = &[
    Operation {
        name: "GetConfigurations",
        request: &GET_CONFIGURATIONS,
        response_root: Some("GetConfigurationsResponse"),
    },
    Operation { name: "ContinuousMove", request: &CONTINUOUS_MOVE, response_root: None },
    Operation { name: "AbsoluteMove", request: &ABSOLUTE_MOVE, response_root: None },
    Operation { name: "RelativeMove", request: &RELATIVE_MOVE, response_root: None },
    Operation { name: "Stop", request: &PTZ_STOP, response_root: None },
    Operation { name: "GotoHomePosition", request: &GOTO_HOME_POSITION, response_root: None },
    Operation {
        name: "GetStatus",
        request: &GET_PTZ_STATUS,
        response_root: Some("GetStatusResponse"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::flatten;

    #[test]
    fn test_service_parse_is_case_insensitive() {
        assert_eq!(Service::parse("Device"), Some(Service::Device));
        assert_eq!(Service::parse("MEDIA"), Some(Service::Media));
        assert_eq!(Service::parse("ptz"), Some(Service::Ptz));
        assert_eq!(Service::parse("doorbell"), None);
    }

    #[test]
    fn test_lookup_known_operation() {
        let op = lookup(Service::Device, "GetSystemDateAndTime").expect("registered");
        assert_eq!(op.name, "GetSystemDateAndTime");
        assert_eq!(op.response_root, Some("GetSystemDateAndTimeResponse"));
    }

    #[test]
    fn test_lookup_unknown_method_is_none() {
        assert!(lookup(Service::Device, "GetStreamUri").is_none());
        assert!(lookup(Service::Media, "NoSuchMethod").is_none());
    }

    #[test]
    fn test_device_roots_are_unprefixed() {
        for op in DEVICE_OPERATIONS {
            let flat = flatten(op.request).expect("flattens");
            assert!(
                !flat[0].meta.name.contains(':'),
                "device root {} must not carry a prefix",
                flat[0].meta.name
            );
        }
    }

    #[test]
    fn test_media_and_ptz_roots_are_prefixed() {
        for op in MEDIA_OPERATIONS {
            let flat = flatten(op.request).expect("flattens");
            assert!(flat[0].meta.name.starts_with("trt:"));
        }
        for op in PTZ_OPERATIONS {
            let flat = flatten(op.request).expect("flattens");
            assert!(flat[0].meta.name.starts_with("tptz:"));
        }
    }

    #[test]
    fn test_continuous_move_flattens_without_vector_attributes() {
        let op = lookup(Service::Ptz, "ContinuousMove").expect("registered");
        let flat = flatten(op.request).expect("flattens");
        let names: Vec<&str> = flat.iter().map(|f| f.meta.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "tptz:ContinuousMove",
                "tptz:ProfileToken",
                "tptz:Velocity",
                "tt:PanTilt",
                "tt:Zoom",
            ]
        );
    }

    #[test]
    fn test_every_registered_descriptor_flattens() {
        for table in [DEVICE_OPERATIONS, MEDIA_OPERATIONS, IMAGING_OPERATIONS, PTZ_OPERATIONS] {
            for op in table {
                let flat = flatten(op.request).expect("flattens");
                assert!(!flat.is_empty(), "operation {} has no fields", op.name);
            }
        }
    }
}
