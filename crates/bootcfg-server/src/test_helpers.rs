//! Test helpers for bootcfg-server
//!
//! Fixture Groups, Profiles and templates in a `MemoryStore`, and a router
//! over them.

use crate::server::Server;
use crate::store::{MemoryStore, Store};
use bootcfg_model::{Boot, Group, Profile};
use std::sync::Arc;

pub const IGNITION_YAML: &str = "
systemd:
  units:
    - name: {{ service_name }}.service
      enable: true
    - name: {{ uuid }}.service
      enable: true
";

pub const CLOUD_CONFIG: &str = "#cloud-config\ncoreos:\n  etcd2:\n    name: {{ service_name }}\n";

pub const GENERIC: &str = "service={{ service_name }} uuid={{ uuid }}\n";

/// Group selecting on `uuid=a1b2c3d4`
pub fn test_group() -> Group {
    Group::new("test-group", "g1h2i3j4")
        .with_name("test group")
        .with_selector("uuid", "a1b2c3d4")
        .with_metadata("service_name", "etcd2")
}

/// Group selecting on the fixture MAC address
pub fn mac_group() -> Group {
    Group::new("pxe-node", "g1h2i3j4").with_selector("mac", "52:54:00:a1:9c:ae")
}

pub fn test_profile() -> Profile {
    Profile::new("g1h2i3j4")
        .with_boot(
            Boot::new("/image/kernel")
                .with_initrd("/image/initrd_a")
                .with_initrd("/image/initrd_b")
                .with_arg("a", "b")
                .with_arg("c", ""),
        )
        .with_ignition("ignition.yaml")
        .with_cloud("etcd.cloud")
        .with_generic("generic.tmpl")
}

/// Store holding the fixture Groups, Profile and templates
pub fn fixture_store() -> Arc<dyn Store> {
    let store = MemoryStore::new();
    store.group_put(&test_group()).unwrap();
    store.group_put(&mac_group()).unwrap();
    store.profile_put(&test_profile()).unwrap();
    store.ignition_put("ignition.yaml", IGNITION_YAML).unwrap();
    store.cloud_put("etcd.cloud", CLOUD_CONFIG).unwrap();
    store.generic_put("generic.tmpl", GENERIC).unwrap();
    Arc::new(store)
}

pub fn fixture_server() -> Server {
    Server::new(fixture_store())
}

/// Router over the fixture store
pub fn create_test_router() -> axum::Router {
    crate::router(fixture_server(), None)
}

/// Router over an empty store
pub fn create_empty_router() -> axum::Router {
    crate::router(Server::new(Arc::new(MemoryStore::new())), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    async fn get(app: axum::Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_home() {
        let response = get(create_test_router(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "bootcfg\n");
    }

    #[tokio::test]
    async fn test_bootstrap_routes() {
        for uri in ["/boot.ipxe", "/boot.ipxe.0"] {
            let response = get(create_empty_router(), uri).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().get(CONTENT_TYPE).is_none());
            assert_eq!(
                body_string(response).await,
                "#!ipxe\nchain ipxe?uuid=${uuid}&mac=${mac:hexhyp}&domain=${domain}&hostname=${hostname}&serial=${serial}\n"
            );
        }
    }

    #[tokio::test]
    async fn test_ipxe() {
        let response = get(create_test_router(), "/ipxe?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(
            body_string(response).await,
            "#!ipxe\nkernel /image/kernel a=b c\ninitrd /image/initrd_a /image/initrd_b \nboot\n"
        );
    }

    #[tokio::test]
    async fn test_ipxe_by_mac_label() {
        let response = get(create_test_router(), "/ipxe?mac=52-54-00-a1-9c-ae").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ipxe_no_match() {
        let response = get(create_test_router(), "/ipxe?uuid=unknown").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ipxe_profile_without_boot() {
        let store = fixture_store();
        store.profile_put(&Profile::new("g1h2i3j4")).unwrap();
        let app = crate::router(Server::new(store), None);
        let response = get(app, "/ipxe?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pixiecore() {
        for uri in [
            "/pixiecore/v1/boot/52:54:00:a1:9c:ae",
            "/pixiecore/v1/boot/52%3A54%3A00%3Aa1%3A9c%3Aae",
        ] {
            let response = get(create_test_router(), uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            assert_eq!(
                response.headers().get(CONTENT_TYPE).unwrap(),
                "application/json"
            );
            assert_eq!(
                body_string(response).await,
                r#"{"kernel":"/image/kernel","initrd":["/image/initrd_a","/image/initrd_b"],"cmdline":{"a":"b","c":""}}"#
            );
        }
    }

    #[tokio::test]
    async fn test_pixiecore_invalid_mac() {
        let response = get(create_test_router(), "/pixiecore/v1/boot/").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "invalid MAC address /\n");

        let response = get(create_test_router(), "/pixiecore/v1/boot/zz:zz").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "invalid MAC address /zz:zz\n");
    }

    #[tokio::test]
    async fn test_pixiecore_segment_decoded_once() {
        let response = get(
            create_test_router(),
            "/pixiecore/v1/boot/52%253A54%253A00%253Aa1%253A9c%253Aae",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "invalid MAC address /52%3A54%3A00%3Aa1%3A9c%3Aae\n"
        );
    }

    #[tokio::test]
    async fn test_pixiecore_upper_case_mac_selector() {
        let server = Server::new(Arc::new(MemoryStore::new()));
        server.profile_put(&test_profile()).unwrap();
        server
            .group_put(&Group::new("upper", "g1h2i3j4").with_selector("mac", "52:54:00:AA:BB:CC"))
            .unwrap();

        let response = get(
            crate::router(server, None),
            "/pixiecore/v1/boot/52:54:00:aa:bb:cc",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_pixiecore_unknown_mac() {
        let response = get(create_empty_router(), "/pixiecore/v1/boot/52:54:00:a1:9c:ae").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ignition_yaml() {
        let response = get(create_test_router(), "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_string(response).await,
            r#"{"ignition":{"version":"2.0.0","config":{}},"storage":{},"systemd":{"units":[{"name":"etcd2.service","enable":true},{"name":"a1b2c3d4.service","enable":true}]},"networkd":{},"passwd":{}}"#
        );
    }

    #[tokio::test]
    async fn test_ignition_v1_yaml() {
        let store = fixture_store();
        store
            .ignition_put("ignition.yaml", &format!("ignition_version: 1\n{}", IGNITION_YAML))
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            r#"{"ignitionVersion":1,"storage":{},"systemd":{"units":[{"name":"etcd2.service","enable":true},{"name":"a1b2c3d4.service","enable":true}]},"networkd":{},"passwd":{}}"#
        );
    }

    #[tokio::test]
    async fn test_ignition_with_include() {
        let store = fixture_store();
        store
            .ignition_put(
                "ignition.yaml",
                "systemd:\n  units:{{ indent(4, include(\"unit.yaml\", {\"name\": service_name})) }}\n",
            )
            .unwrap();
        store
            .ignition_put("unit.yaml", "- name: {{ name }}.service\n  enable: true")
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            r#"{"ignition":{"version":"2.0.0","config":{}},"storage":{},"systemd":{"units":[{"name":"etcd2.service","enable":true}]},"networkd":{},"passwd":{}}"#
        );
    }

    #[tokio::test]
    async fn test_ignition_storage_and_passwd_served_unchanged() {
        let store = fixture_store();
        store
            .ignition_put(
                "ignition.yaml",
                "
storage:
  files:
    - filesystem: root
      path: /etc/hostname
      mode: 420
      contents:
        source: \"data:,{{ service_name }}\"
        compression: \"\"
networkd:
  units:
    - name: 00-eth0.network
      contents: \"[Match]\\nName=eth0\\n\"
passwd:
  users:
    - name: core
      ssh_authorized_keys:
        - ssh-rsa AAAA
",
            )
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            r#"{"ignition":{"version":"2.0.0","config":{}},"storage":{"files":[{"filesystem":"root","path":"/etc/hostname","contents":{"source":"data:,etcd2","compression":""},"mode":420}]},"systemd":{},"networkd":{"units":[{"name":"00-eth0.network","contents":"[Match]\nName=eth0\n"}]},"passwd":{"users":[{"name":"core","sshAuthorizedKeys":["ssh-rsa AAAA"]}]}}"#
        );
    }

    #[tokio::test]
    async fn test_ignition_v1_storage_served_unchanged() {
        let json = r#"{"ignitionVersion":1,"storage":{"filesystems":[{"device":"/dev/disk/by-label/ROOT","format":"ext4","files":[{"path":"/etc/hostname","contents":"{{ service_name }}"}]}]},"systemd":{},"networkd":{},"passwd":{}}"#;
        let store = fixture_store();
        store.ignition_put("ignition.yaml", json).unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            json.replace("{{ service_name }}", "etcd2")
        );
    }

    #[tokio::test]
    async fn test_ignition_later_v2_served_unchanged() {
        let json = r#"{"ignition":{"version":"2.1.0","config":{},"timeouts":{"httpTotal":30}},"storage":{},"systemd":{"units":[{"name":"{{ service_name }}.service","enabled":true}]},"networkd":{},"passwd":{}}"#;
        let store = fixture_store();
        store.ignition_put("ignition.yaml", json).unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            json.replace("{{ service_name }}", "etcd2")
        );
    }

    #[tokio::test]
    async fn test_ignition_missing_metadata_key() {
        let store = fixture_store();
        store
            .ignition_put("ignition.yaml", "systemd:\n  units:\n    - name: {{ missing_key }}\n")
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_ignition_missing_template() {
        let store = fixture_store();
        store
            .profile_put(&test_profile().with_ignition("absent.yaml"))
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/ignition?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cloud() {
        let response = get(create_test_router(), "/cloud?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(
            body_string(response).await,
            "#cloud-config\ncoreos:\n  etcd2:\n    name: etcd2\n"
        );
    }

    #[tokio::test]
    async fn test_cloud_script() {
        let store = fixture_store();
        store
            .cloud_put("etcd.cloud", "#!/bin/bash\necho {{ service_name }}\n")
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/cloud?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "#!/bin/bash\necho etcd2\n");
    }

    #[tokio::test]
    async fn test_cloud_invalid_user_data() {
        let store = fixture_store();
        store
            .cloud_put("etcd.cloud", "#cloud-config\ncoreos:\n  units: {{ service_name }}\n")
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/cloud?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generic() {
        let response = get(create_test_router(), "/generic?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_string(response).await, "service=etcd2 uuid=a1b2c3d4\n");
    }

    #[tokio::test]
    async fn test_metadata() {
        let store = fixture_store();
        store
            .group_put(
                &Group::new("pod", "g1h2i3j4")
                    .with_selector("pod_network", "10.2.0.0/16")
                    .with_metadata("service_name", "etcd2"),
            )
            .unwrap();
        let app = crate::router(Server::new(store), None);

        let response = get(app, "/metadata?pod_network=10.2.0.0/16&uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");

        let body = body_string(response).await;
        let lines: BTreeSet<&str> = body.lines().collect();
        assert_eq!(
            lines,
            BTreeSet::from(["POD_NETWORK=10.2.0.0/16", "SERVICE_NAME=etcd2", "UUID=a1b2c3d4"])
        );
    }

    #[tokio::test]
    async fn test_metadata_edge_cases() {
        let cases = [
            (r#"{"num":3}"#, "NUM=3\n"),
            (r#"{"yes":true}"#, "YES=true\n"),
            (r#"{"no":false}"#, "NO=false\n"),
            (r#"{"list":["3","d"]}"#, "LIST=[3 d]\n"),
        ];
        for (json, expected) in cases {
            let store = MemoryStore::new();
            let mut group = Group::new("default", "p");
            group.metadata = bootcfg_model::metadata_from_json(json).unwrap();
            store.group_put(&group).unwrap();
            let app = crate::router(Server::new(Arc::new(store)), None);

            let response = get(app, "/metadata").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_string(response).await, expected, "for {}", json);
        }
    }

    #[tokio::test]
    async fn test_metadata_multiline_value_not_served() {
        let store = MemoryStore::new();
        let group = Group::new("default", "p")
            .with_metadata("ca_cert", "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----");
        store.group_put(&group).unwrap();
        let app = crate::router(Server::new(Arc::new(store)), None);

        let response = get(app, "/metadata").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metadata_no_group() {
        let response = get(create_empty_router(), "/metadata?uuid=a1b2c3d4").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_profile_reference_is_not_found() {
        let store = fixture_store();
        store.group_put(&Group::new("test-group", "").with_selector("uuid", "a1b2c3d4")).unwrap();
        let app = crate::router(Server::new(store), None);

        for uri in ["/ipxe", "/ignition", "/cloud", "/generic"] {
            let response = get(app.clone(), &format!("{}?uuid=a1b2c3d4", uri)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_assets() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("kernel"), "vmlinuz").unwrap();
        let app = crate::router(fixture_server(), Some(tmp.path().to_path_buf()));

        let response = get(app, "/assets/kernel").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "vmlinuz");
    }
}
