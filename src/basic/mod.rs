pub(crate) mod dcpf;
pub(crate) mod dsbus_dv;
pub mod elements;
pub mod error;
pub(crate) mod gauss_seidel;
pub mod island;
pub mod network;
pub(crate) mod newtonpf;
pub mod solver;
pub(crate) mod sparse;
pub mod system;

pub use dcpf::dc_pf;
pub use gauss_seidel::gauss_seidel_pf;
pub use newtonpf::newton_pf;
