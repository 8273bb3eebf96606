//! Small reference networks used by the tests and the demo.
//!
//! All networks use a 100 MVA base and 10 kV buses.

use crate::basic::{elements::*, error::Result, network::Network};

fn bus(net: &mut Network, id: i64, bus_type: BusType) -> Result<usize> {
    net.add_bus(Bus::new(id, format!("bus {id}"), 10.0).with_type(bus_type))
}

fn build(name: &str, f: impl FnOnce(&mut Network) -> Result<()>) -> Result<Network> {
    let mut net = Network::new(name, 100.0);
    f(&mut net)?;
    Ok(net)
}

/// Slack bus feeding a 1.0 + j0.5 p.u. load over one line (r = 0.01, x = 0.1).
pub fn two_bus() -> Result<Network> {
    build("two_bus", |net| {
        bus(net, 1, BusType::Slack)?;
        bus(net, 2, BusType::PQ)?;
        net.add_branch(Branch::line("1-2", 1, 2, 0.01, 0.1))?;
        net.add_injection(Injection::load("load 2", 2, 100.0, 50.0))?;
        Ok(())
    })
}

/// Two slack + load pairs with no branch between them.
pub fn two_pairs() -> Result<Network> {
    build("two_pairs", |net| {
        bus(net, 1, BusType::Slack)?;
        bus(net, 2, BusType::PQ)?;
        bus(net, 3, BusType::Slack)?;
        bus(net, 4, BusType::PQ)?;
        net.add_branch(Branch::line("1-2", 1, 2, 0.01, 0.1))?;
        net.add_branch(Branch::line("3-4", 3, 4, 0.02, 0.08))?;
        net.add_injection(Injection::load("load 2", 2, 40.0, 10.0))?;
        net.add_injection(Injection::load("load 4", 4, 25.0, 5.0))?;
        Ok(())
    })
}

/// A static generator feeding a load; neither bus is a slack bus.
pub fn no_slack_pair() -> Result<Network> {
    build("no_slack_pair", |net| {
        bus(net, 1, BusType::PQ)?;
        bus(net, 2, BusType::PQ)?;
        net.add_branch(Branch::line("1-2", 1, 2, 0.01, 0.1))?;
        net.add_injection(Injection::static_generator("sgen 1", 1, 30.0, 10.0))?;
        net.add_injection(Injection::load("load 2", 2, 30.0, 10.0))?;
        Ok(())
    })
}

/// [`two_bus`] plus a second island without a slack bus.
pub fn pair_and_no_slack_pair() -> Result<Network> {
    build("pair_and_no_slack_pair", |net| {
        bus(net, 1, BusType::Slack)?;
        bus(net, 2, BusType::PQ)?;
        bus(net, 3, BusType::PQ)?;
        bus(net, 4, BusType::PQ)?;
        net.add_branch(Branch::line("1-2", 1, 2, 0.01, 0.1))?;
        net.add_branch(Branch::line("3-4", 3, 4, 0.01, 0.1))?;
        net.add_injection(Injection::load("load 2", 2, 50.0, 20.0))?;
        net.add_injection(Injection::load("load 4", 4, 10.0, 2.0))?;
        Ok(())
    })
}

/// A lone slack bus.
pub fn isolated_slack() -> Result<Network> {
    build("isolated_slack", |net| {
        bus(net, 1, BusType::Slack)?;
        Ok(())
    })
}

/// Five-bus meshed network with a PV generator, a capacitor bank, an
/// off-nominal transformer and an HVDC link, plus an out-of-service bus and
/// line.
pub fn five_bus() -> Result<Network> {
    build("five_bus", |net| {
        bus(net, 1, BusType::Slack)?;
        bus(net, 2, BusType::PQ)?;
        bus(net, 3, BusType::PQ)?;
        bus(net, 4, BusType::PQ)?;
        bus(net, 5, BusType::PQ)?;
        net.add_bus(Bus::new(6, "bus 6", 10.0).inactive())?;

        net.add_branch(Branch::line("1-2", 1, 2, 0.02, 0.06).with_charging(0.0, 0.06).with_rate(150.0))?;
        net.add_branch(Branch::line("1-3", 1, 3, 0.08, 0.24).with_charging(0.0, 0.05).with_rate(100.0))?;
        net.add_branch(Branch::line("2-3", 2, 3, 0.06, 0.18).with_charging(0.0, 0.04).with_rate(100.0))?;
        net.add_branch(Branch::line("2-4", 2, 4, 0.06, 0.18).with_charging(0.0, 0.04).with_rate(100.0))?;
        net.add_branch(Branch::line("3-4", 3, 4, 0.01, 0.03).with_charging(0.0, 0.02).with_rate(100.0))?;
        net.add_branch(Branch::transformer("T 3-5", 3, 5, 0.005, 0.08, 0.975).with_rate(60.0))?;
        net.add_branch(Branch::line("1-4 (open)", 1, 4, 0.05, 0.2).inactive())?;
        net.add_branch(Branch::line("4-6", 4, 6, 0.05, 0.2))?;

        net.add_injection(Injection::generator("gen 1", 1, 0.0, 1.02))?;
        net.add_injection(Injection::generator("gen 2", 2, 40.0, 1.01))?;
        net.add_injection(Injection::load("load 3", 3, 60.0, 20.0))?;
        net.add_injection(Injection::load("load 4", 4, 40.0, 15.0))?;
        net.add_injection(Injection::shunt("cap 4", 4, 0.0, 10.0))?;
        net.add_injection(Injection::load("load 5", 5, 20.0, 5.0))?;
        net.add_injection(Injection::load("load 6", 6, 5.0, 1.0))?;

        net.add_hvdc(HvdcLink::new("dc 2-5", 2, 5, 10.0, 50.0).with_loss_factor(0.02))?;
        Ok(())
    })
}
