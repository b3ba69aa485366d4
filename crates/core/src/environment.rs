//! 환경 테이블: 쿠버네티스 배포판별 명령과 대상 정보
//!
//! 시나리오 본문은 하나이고, 배포판마다 달라지는 부분은 전부
//! [`EnvironmentConfig`] 데이터로 표현합니다. 기본 제공 다섯 가지
//! (minikube, kind, k0s, k3s, microk8s)는 [`builtin_environments`]가 반환하며,
//! `adash.toml`의 `[[environments]]` 섹션으로 교체할 수 있습니다.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── DistributionKind ────────────────────────────────────────────────

/// 배포판 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionKind {
    /// VM 안에서 클러스터를 생성하는 로컬 클러스터 도구 (minikube, kind)
    LocalCluster,
    /// 단일 바이너리 경량 배포판 (k0s, k3s, microk8s)
    SingleBinary,
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalCluster => write!(f, "local-cluster"),
            Self::SingleBinary => write!(f, "single-binary"),
        }
    }
}

// ─── EnvironmentConfig ───────────────────────────────────────────────

/// 배포판 하나에 대한 환경 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// 고유 이름 (예: `"kind"`)
    pub name: String,
    /// 리포트에 표시할 시나리오 이름
    pub title: String,
    /// 배포판 유형
    pub kind: DistributionKind,
    /// Vagrantfile이 있는 디렉토리 (`vm.root` 기준 상대 경로)
    pub vagrant_dir: String,
    /// 클러스터 시작 명령. VM 프로비저닝 시 이미 기동되는 배포판은 `None`
    #[serde(default)]
    pub start_command: Option<String>,
    /// 클러스터 상태 확인 명령 (종료 코드 0이면 준비 완료)
    pub status_command: String,
    /// 시나리오 종료 시 실행할 정리 명령
    #[serde(default)]
    pub cleanup_command: Option<String>,
    /// kubectl 호출 방식 (예: `"sudo k3s kubectl"`)
    #[serde(default = "default_kubectl")]
    pub kubectl: String,
    /// 오퍼레이터를 배포할 네임스페이스
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// 클러스터 시작 후 추가 대기 시간 (초)
    #[serde(default)]
    pub settle_secs: u64,
    /// 활성화 여부
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl EnvironmentConfig {
    /// 이 배포판의 kubectl로 실행할 명령 문자열을 만듭니다.
    pub fn kubectl(&self, args: &str) -> String {
        format!("{} {}", self.kubectl, args)
    }
}

fn default_kubectl() -> String {
    "kubectl".to_owned()
}

fn default_namespace() -> String {
    "kube-system".to_owned()
}

fn default_enabled() -> bool {
    true
}

// ─── Builtin table ───────────────────────────────────────────────────

struct Builtin {
    name: &'static str,
    title: &'static str,
    kind: DistributionKind,
    vagrant_dir: &'static str,
    start_command: Option<&'static str>,
    status_command: &'static str,
    cleanup_command: Option<&'static str>,
    kubectl: &'static str,
    settle_secs: u64,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "minikube",
        title: "Test Altinity Dashboard with Minikube Kubernetes",
        kind: DistributionKind::LocalCluster,
        vagrant_dir: "minikubeOnVagrant",
        start_command: Some("minikube start"),
        status_command: "minikube status",
        cleanup_command: None,
        kubectl: "kubectl",
        settle_secs: 0,
    },
    Builtin {
        name: "kind",
        title: "Test Altinity Dashboard with Kind Kubernetes",
        kind: DistributionKind::LocalCluster,
        vagrant_dir: "KindOnVagrant",
        start_command: Some("kind create cluster"),
        status_command: "kubectl cluster-info --context kind-kind",
        cleanup_command: Some("kind delete cluster"),
        kubectl: "kubectl",
        settle_secs: 5,
    },
    Builtin {
        name: "k0s",
        title: "Test Altinity Dashboard with K0s Kubernetes",
        kind: DistributionKind::SingleBinary,
        vagrant_dir: "K0sOnVagrant",
        start_command: None,
        status_command: "sudo k0s status",
        cleanup_command: None,
        kubectl: "sudo k0s kubectl",
        settle_secs: 0,
    },
    Builtin {
        name: "k3s",
        title: "Test Altinity Dashboard with K3s Kubernetes",
        kind: DistributionKind::SingleBinary,
        vagrant_dir: "K3sOnVagrant",
        start_command: Some("sudo k3s server > /tmp/k3s.log 2>&1 &"),
        status_command: "sudo k3s kubectl get nodes",
        cleanup_command: None,
        kubectl: "sudo k3s kubectl",
        settle_secs: 0,
    },
    Builtin {
        name: "microk8s",
        title: "Test Altinity Dashboard with Microk8s Kubernetes",
        kind: DistributionKind::SingleBinary,
        vagrant_dir: "microK8SOnVagrant",
        start_command: Some("microk8s start"),
        status_command: "microk8s status --wait-ready",
        cleanup_command: None,
        kubectl: "microk8s kubectl",
        settle_secs: 0,
    },
];

/// 기본 제공 환경 다섯 가지를 반환합니다.
pub fn builtin_environments() -> Vec<EnvironmentConfig> {
    BUILTINS
        .iter()
        .map(|b| EnvironmentConfig {
            name: b.name.to_owned(),
            title: b.title.to_owned(),
            kind: b.kind,
            vagrant_dir: b.vagrant_dir.to_owned(),
            start_command: b.start_command.map(str::to_owned),
            status_command: b.status_command.to_owned(),
            cleanup_command: b.cleanup_command.map(str::to_owned),
            kubectl: b.kubectl.to_owned(),
            namespace: default_namespace(),
            settle_secs: b.settle_secs,
            enabled: true,
        })
        .collect()
}
